// Embedded dashboard page; all state lives in the service, the page only renders views
use axum::{
    http::header,
    response::{Html, IntoResponse},
};

pub async fn dashboard() -> impl IntoResponse {
    (
        [(header::CACHE_CONTROL, "public, max-age=60")],
        Html(DASHBOARD_HTML),
    )
}

const DASHBOARD_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>River Dashboard</title>
    <script src="https://cdn.jsdelivr.net/npm/echarts@5/dist/echarts.min.js"></script>
    <style>
        body { font-family: system-ui, sans-serif; background: #f8fafc; color: #1e293b; margin: 0; }
        .container { max-width: 1200px; margin: 0 auto; padding: 1.5rem; }
        .grid { display: grid; grid-template-columns: repeat(2, 1fr); gap: 1.5rem; }
        .card { background: #fff; border: 1px solid #e0e0e0; border-radius: 12px; padding: 1rem; }
        .chart { height: 350px; }
        .controls { display: flex; justify-content: center; align-items: center; gap: 15px; margin-top: 10px; }
        .error { color: #721c24; background: #f8d7da; padding: 10px; border-radius: 4px; margin-bottom: 10px; }
        button { padding: 8px 16px; border: none; border-radius: 4px; color: #fff; background: #002353; font-weight: 600; cursor: pointer; }
        button:disabled { opacity: 0.5; cursor: not-allowed; }
        button.reset { background: #6c757d; }
        textarea { width: 100%; height: 150px; font-family: monospace; box-sizing: border-box; }
        table { width: 100%; border-collapse: collapse; font-size: 0.9rem; }
        th, td { padding: 8px; border-bottom: 1px solid #eee; text-align: left; word-break: break-all; }
    </style>
</head>
<body>
<div class="container">
    <h1>Analytics Overview</h1>
    <div class="grid" id="charts"></div>
    <div class="card" style="margin-top: 1.5rem">
        <div class="controls" style="justify-content: flex-start">
            <label><strong>Database Type:</strong></label>
            <select id="backend"></select>
            <button id="execute">EXECUTE</button>
        </div>
        <div id="console-error"></div>
        <textarea id="query" placeholder="Enter your SPARQL query here..."></textarea>
        <table><thead id="thead"></thead><tbody id="tbody"></tbody></table>
        <div class="controls">
            <button id="previous">Previous</button><span id="page"></span><button id="next">Next</button>
        </div>
    </div>
</div>
<script>
const charts = {};

async function call(method, url, body) {
    const res = await fetch(url, {
        method,
        headers: { 'Content-Type': 'application/json' },
        body: body ? JSON.stringify(body) : undefined,
    });
    return res.json();
}

function withTooltip(spec) {
    const digits = spec.tooltip.valuePrecision;
    if (digits !== undefined) {
        spec.tooltip.valueFormatter = (v) => Number(v).toFixed(digits);
        delete spec.tooltip.valuePrecision;
    }
    return spec;
}

function el(tag, text, className) {
    const node = document.createElement(tag);
    if (text !== undefined && text !== null) node.textContent = String(text);
    if (className) node.className = className;
    return node;
}

function showError(target, message) {
    target.replaceChildren(...(message ? [el('div', message, 'error')] : []));
}

function refresh(id) {
    return (view) => view.id ? renderChart(view) : call('GET', `/api/charts/${encodeURIComponent(id)}`).then(renderChart);
}

function renderChart(view) {
    let card = document.getElementById('card-' + view.id);
    if (!card) {
        const path = `/api/charts/${encodeURIComponent(view.id)}`;
        card = el('div', null, 'card');
        card.id = 'card-' + view.id;
        const controls = el('div', null, 'controls');
        controls.append(el('span', null, 'count'), el('button', null, 'action'), el('button', 'Reset', 'reset'));
        card.append(el('div', null, 'err'), el('div', null, 'chart'), controls);
        document.getElementById('charts').appendChild(card);
        charts[view.id] = echarts.init(card.querySelector('.chart'));
        card.querySelector('.action').onclick = () => {
            const verb = card.dataset.affordance === 'initial_load' ? 'load' : 'more';
            card.querySelector('.action').disabled = true;
            call('POST', `${path}/${verb}`).then(refresh(view.id));
        };
        card.querySelector('.reset').onclick = () => call('POST', `${path}/reset`).then(refresh(view.id));
    }
    card.dataset.affordance = view.affordance;
    showError(card.querySelector('.err'), view.error);
    card.querySelector('.count').replaceChildren('Showing ', el('strong', view.observations), ' observations');
    const action = card.querySelector('.action');
    action.textContent = view.action_label;
    action.disabled = !view.action_enabled;
    charts[view.id].setOption(withTooltip(view.spec), true);
}

function renderConsole(view) {
    const errorBox = document.getElementById('console-error');
    if (view.table === undefined) {
        showError(errorBox, view.error);
        return;
    }
    const select = document.getElementById('backend');
    select.replaceChildren(...view.backends.map((b) => {
        const option = el('option', b);
        option.value = b;
        return option;
    }));
    select.value = view.backend;
    document.getElementById('query').value = view.query;
    showError(errorBox, view.error);
    const head = el('tr');
    head.append(...view.table.columns.map((c) => el('th', c)));
    document.getElementById('thead').replaceChildren(head);
    const body = document.getElementById('tbody');
    if (view.table.placeholder) {
        const cell = el('td', view.table.placeholder);
        cell.style.textAlign = 'center';
        const row = el('tr');
        row.append(cell);
        body.replaceChildren(row);
    } else {
        body.replaceChildren(...view.table.rows.map((r) => {
            const row = el('tr');
            row.append(...r.map((c) => el('td', c)));
            return row;
        }));
    }
    document.getElementById('page').textContent = `Page ${view.page}`;
    document.getElementById('previous').disabled = !view.can_previous;
    document.getElementById('next').disabled = !view.can_next;
}

document.getElementById('backend').onchange = (e) =>
    call('POST', '/api/console/backend', { backend: e.target.value }).then(renderConsole);
document.getElementById('execute').onclick = () =>
    call('POST', '/api/console/execute', { query: document.getElementById('query').value }).then(renderConsole);
document.getElementById('next').onclick = () => call('POST', '/api/console/next').then(renderConsole);
document.getElementById('previous').onclick = () => call('POST', '/api/console/previous').then(renderConsole);

call('GET', '/api/charts').then((views) => views.forEach(renderChart));
call('GET', '/api/console').then(renderConsole);
window.addEventListener('resize', () => Object.values(charts).forEach((c) => c.resize()));
</script>
</body>
</html>
"##;
