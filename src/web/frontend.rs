//! Embedded HTML/CSS/JS frontend for the ola chat UI.
//!
//! The entire page is compiled into the binary as a string constant.
//! No external assets, no build tools, no CDN dependencies.

/// The complete single-page chat UI.
pub const INDEX_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>ola</title>
<style>
:root {
  --bg: #0d1117;
  --surface: #161b22;
  --border: #30363d;
  --text: #e6edf3;
  --text-muted: #8b949e;
  --accent: #58a6ff;
  --red: #f85149;
  --radius: 8px;
  --font: -apple-system, BlinkMacSystemFont, 'Segoe UI', Helvetica, Arial, sans-serif;
  --mono: 'SF Mono', 'Cascadia Code', 'Fira Code', monospace;
}

* { margin: 0; padding: 0; box-sizing: border-box; }
body {
  background: var(--bg);
  color: var(--text);
  font-family: var(--font);
  font-size: 14px;
  line-height: 1.5;
}

.app {
  max-width: 900px;
  margin: 0 auto;
  padding: 24px;
  display: flex;
  flex-direction: column;
  height: 100vh;
}

header {
  display: flex;
  align-items: center;
  gap: 12px;
  padding-bottom: 12px;
  border-bottom: 1px solid var(--border);
}
header h1 { font-size: 22px; font-weight: 600; flex: 1; }

select, input, button {
  background: var(--surface);
  color: var(--text);
  border: 1px solid var(--border);
  border-radius: var(--radius);
  padding: 6px 10px;
  font: inherit;
}
button { cursor: pointer; }
button:hover { border-color: var(--accent); }
button:disabled { opacity: 0.5; cursor: wait; }

#current-metrics {
  color: var(--text-muted);
  font-size: 13px;
  padding: 8px 0;
}

#chat-area {
  flex: 1;
  overflow-y: auto;
  padding: 12px 0;
  display: flex;
  flex-direction: column;
  gap: 10px;
}

.message {
  max-width: 80%;
  padding: 10px 14px;
  border-radius: var(--radius);
  white-space: normal;
  word-wrap: break-word;
}
.message.user { align-self: flex-end; background: #1f6feb33; border: 1px solid #1f6feb66; }
.message.model { align-self: flex-start; background: var(--surface); border: 1px solid var(--border); }
.message.error { color: var(--red); }
.message pre { background: var(--bg); padding: 8px; border-radius: 6px; overflow-x: auto; font-family: var(--mono); }

.rating { margin-top: 6px; text-align: right; }
.rating button { padding: 2px 8px; }
.rating .thanks { color: var(--accent); font-weight: 500; }

#chat-form { display: flex; gap: 8px; padding-top: 12px; border-top: 1px solid var(--border); }
#user-input { flex: 1; }

.modal {
  display: none;
  position: fixed;
  inset: 0;
  background: #000a;
}
.modal-content {
  background: var(--surface);
  border: 1px solid var(--border);
  border-radius: var(--radius);
  max-width: 720px;
  margin: 10vh auto;
  padding: 20px;
}
.modal-content h2 { font-size: 18px; margin-bottom: 12px; }
.modal-actions { display: flex; justify-content: flex-end; gap: 8px; margin-top: 16px; }
table { width: 100%; border-collapse: collapse; }
th, td { text-align: left; padding: 6px 8px; border-bottom: 1px solid var(--border); }
th { color: var(--text-muted); font-weight: 500; }
</style>
</head>
<body>
<div class="app">
  <header>
    <h1>ola</h1>
    <select id="model-select" aria-label="Model"></select>
    <button id="show-metrics">Metrics</button>
  </header>
  <div id="current-metrics"></div>
  <div id="chat-area"></div>
  <form id="chat-form">
    <input id="user-input" autocomplete="off" placeholder="Send a message...">
    <button id="send-btn" type="submit">Send</button>
  </form>
</div>

<div id="metrics-modal" class="modal">
  <div class="modal-content">
    <h2>Model metrics</h2>
    <table id="metrics-table">
      <thead>
        <tr><th>Model</th><th>Size</th><th>Avg latency</th><th>Tokens/sec</th><th>Rating</th><th>Last used</th></tr>
      </thead>
      <tbody></tbody>
    </table>
    <div class="modal-actions">
      <button id="reset-metrics">Reset</button>
      <button id="close-metrics">Close</button>
    </div>
  </div>
</div>

<script>
const modelSelect = document.getElementById('model-select');
const chatArea = document.getElementById('chat-area');
const chatForm = document.getElementById('chat-form');
const userInput = document.getElementById('user-input');
const sendBtn = document.getElementById('send-btn');
const metricsModal = document.getElementById('metrics-modal');

let currentModel = '';

async function api(method, path, body) {
  const opts = { method, headers: {} };
  if (body !== undefined) {
    opts.headers['Content-Type'] = 'application/json';
    opts.body = JSON.stringify(body);
  }
  const res = await fetch(path, opts);
  return res.json();
}

function escapeHTML(str) {
  return str.replace(/[&<>"']/g, c => ({
    '&': '&amp;', '<': '&lt;', '>': '&gt;', '"': '&quot;', "'": '&#39;'
  }[c]));
}

function formatModelContent(content) {
  return escapeHTML(content)
    .replace(/```([\s\S]*?)```/g, '<pre><code>$1</code></pre>')
    .replace(/\*\*(.*?)\*\*/g, '<b>$1</b>')
    .replace(/\*(.*?)\*/g, '<i>$1</i>')
    .replace(/\n/g, '<br>');
}

// Rating controls are attached only when the turn names its originating model.
function addMessage(role, content, origin) {
  const div = document.createElement('div');
  div.className = 'message ' + role;
  if (role === 'model') {
    div.innerHTML = formatModelContent(content);
  } else {
    div.textContent = content;
  }
  if (origin) addRatingButtons(div, origin);
  chatArea.appendChild(div);
  chatArea.scrollTop = chatArea.scrollHeight;
  return div;
}

function addRatingButtons(msgDiv, model) {
  const rating = document.createElement('div');
  rating.className = 'rating';
  rating.innerHTML =
    '<button data-good="1" title="Good">&#128077;</button> ' +
    '<button data-good="0" title="Bad">&#128078;</button>';
  rating.querySelectorAll('button').forEach(btn => {
    btn.onclick = async () => {
      await api('POST', '/api/vote', { model, good: btn.dataset.good === '1' });
      rating.innerHTML = '<span class="thanks">Thank you!</span>';
      refreshMetrics();
    };
  });
  msgDiv.appendChild(rating);
}

async function refreshMetrics() {
  const el = document.getElementById('current-metrics');
  if (!currentModel) { el.textContent = ''; return; }
  const m = await api('GET', '/api/metrics?model=' + encodeURIComponent(currentModel));
  el.innerHTML = '<b>' + escapeHTML(currentModel) + '</b> | Size: ' + m.size +
    ' | Avg Latency: ' + m.avg_latency + ' | Tokens/sec: ' + m.avg_throughput +
    ' | Rating: ' + m.rating + ' &#11088;';
}

async function refreshMetricsTable() {
  const rows = await api('GET', '/api/metrics');
  const tbody = document.querySelector('#metrics-table tbody');
  tbody.innerHTML = '';
  rows.forEach(r => {
    const tr = document.createElement('tr');
    [r.model, r.size, r.avg_latency, r.avg_throughput, r.rating + ' ⭐', r.last_used].forEach(v => {
      const td = document.createElement('td');
      td.textContent = v;
      tr.appendChild(td);
    });
    tbody.appendChild(tr);
  });
}

async function selectModel(model) {
  currentModel = model;
  chatArea.innerHTML = '';
  await api('POST', '/api/session', { model });
  refreshMetrics();
}

async function fetchModels() {
  const models = await api('GET', '/api/models');
  modelSelect.innerHTML = '';
  if (!Array.isArray(models)) {
    addMessage('model error', '[Error: ' + (models.error || 'Failed to fetch models') + ']');
    return;
  }
  models.forEach(m => {
    const opt = document.createElement('option');
    opt.value = m.name;
    opt.textContent = m.name;
    modelSelect.appendChild(opt);
  });
  if (models.length) await selectModel(models[0].name);
}

modelSelect.addEventListener('change', e => selectModel(e.target.value));

chatForm.addEventListener('submit', async e => {
  e.preventDefault();
  const text = userInput.value.trim();
  if (!text || !currentModel || sendBtn.disabled) return;
  const model = currentModel;
  addMessage('user', text);
  userInput.value = '';
  sendBtn.disabled = true;
  const placeholder = addMessage('model', '...');
  try {
    const data = await api('POST', '/api/chat', { content: text });
    placeholder.remove();
    if (model !== currentModel) return;
    if (data.content) {
      addMessage('model', data.content, data.model);
      refreshMetrics();
    } else {
      addMessage('model error', data.error || '[Error: unknown]');
    }
  } catch (err) {
    placeholder.remove();
    addMessage('model error', '[Network error]');
  } finally {
    sendBtn.disabled = false;
  }
});

document.getElementById('show-metrics').onclick = async () => {
  await refreshMetricsTable();
  metricsModal.style.display = 'block';
};
document.getElementById('close-metrics').onclick = () => {
  metricsModal.style.display = 'none';
};
window.onclick = e => {
  if (e.target === metricsModal) metricsModal.style.display = 'none';
};
document.getElementById('reset-metrics').onclick = async () => {
  if (!confirm('Reset all metrics?')) return;
  await api('POST', '/api/metrics/reset');
  refreshMetricsTable();
  refreshMetrics();
};

window.addEventListener('DOMContentLoaded', fetchModels);
</script>
</body>
</html>
"##;
