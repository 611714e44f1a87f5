use crate::settings::Preferences;

pub fn render_index(date: &str, preferences: &Preferences) -> String {
    let theme = if preferences.dark_mode { "dark" } else { "light" };
    INDEX_HTML
        .replace("{{DATE}}", date)
        .replace("{{THEME}}", theme)
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en" data-theme="{{THEME}}">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>Habit Tracker</title>
  <style>
    @import url('https://fonts.googleapis.com/css2?family=Space+Grotesk:wght@400;500;600&family=Fraunces:wght@600&display=swap');

    :root {
      --bg: #f8f3e6;
      --ink: #2b2a28;
      --muted: #6b6862;
      --card: rgba(255, 255, 255, 0.9);
      --line: #e7e0d2;
      --accent: #7c4dff;
      --done: #2e9e6a;
      --warn: #e08a00;
      --empty: #d9483b;
      --shadow: 0 18px 40px rgba(47, 72, 88, 0.14);
    }

    [data-theme="dark"] {
      --bg: #14161c;
      --ink: #eceae4;
      --muted: #9a978f;
      --card: rgba(32, 35, 44, 0.92);
      --line: #2f3340;
      --shadow: none;
    }

    * {
      box-sizing: border-box;
    }

    body {
      margin: 0;
      min-height: 100vh;
      background: var(--bg);
      color: var(--ink);
      font-family: "Space Grotesk", "Trebuchet MS", sans-serif;
      display: grid;
      justify-items: center;
      padding: 28px 16px 48px;
    }

    .app {
      width: min(720px, 100%);
      display: grid;
      gap: 20px;
    }

    header {
      display: flex;
      justify-content: space-between;
      align-items: flex-end;
    }

    h1 {
      font-family: "Fraunces", "Georgia", serif;
      font-size: clamp(1.8rem, 4vw, 2.4rem);
      margin: 0;
    }

    h2 {
      margin: 0 0 12px;
      font-size: 1rem;
      text-transform: uppercase;
      letter-spacing: 0.12em;
      color: var(--muted);
    }

    h3 {
      margin: 12px 0 8px;
      font-size: 0.8rem;
      text-transform: uppercase;
      letter-spacing: 0.1em;
      color: var(--muted);
    }

    .card {
      background: var(--card);
      border: 1px solid var(--line);
      border-radius: 20px;
      box-shadow: var(--shadow);
      padding: 20px;
    }

    .item {
      display: flex;
      justify-content: space-between;
      align-items: center;
      gap: 12px;
      padding: 12px 14px;
      border: 2px solid var(--line);
      border-radius: 14px;
      margin-bottom: 8px;
      cursor: pointer;
    }

    .item.done {
      border-color: var(--done);
      opacity: 0.75;
    }

    .item.done .name {
      text-decoration: line-through;
    }

    .meta {
      font-size: 0.85rem;
      color: var(--muted);
    }

    .badge {
      font-size: 0.75rem;
      font-weight: 600;
      padding: 2px 8px;
      border-radius: 999px;
      border: 1px solid currentColor;
    }

    .badge.low {
      color: var(--warn);
    }

    .badge.empty {
      color: var(--empty);
    }

    .row {
      display: flex;
      gap: 8px;
      flex-wrap: wrap;
      align-items: center;
    }

    button {
      font: inherit;
      border: 1px solid var(--line);
      background: transparent;
      color: var(--ink);
      border-radius: 10px;
      padding: 6px 12px;
      cursor: pointer;
    }

    button.active {
      background: var(--accent);
      border-color: var(--accent);
      color: #fff;
    }

    input,
    select {
      font: inherit;
      padding: 6px 10px;
      border-radius: 10px;
      border: 1px solid var(--line);
      background: transparent;
      color: var(--ink);
    }

    .bar {
      height: 10px;
      border-radius: 999px;
      background: var(--line);
      overflow: hidden;
      margin: 10px 0;
    }

    .bar > div {
      height: 100%;
      background: var(--accent);
      transition: width 300ms ease;
    }

    .status {
      min-height: 1.2em;
      font-size: 0.85rem;
      color: var(--muted);
    }
  </style>
</head>
<body>
  <main class="app">
    <header>
      <div>
        <p class="meta">Today</p>
        <h1 id="date">{{DATE}}</h1>
      </div>
      <button id="theme-toggle" type="button">Toggle theme</button>
    </header>

    <section class="card">
      <h2>Supplements <span id="supp-summary" class="meta"></span></h2>
      <div id="supplements"></div>
      <form id="supp-form" class="row">
        <input name="name" placeholder="New supplement" required />
        <input name="dosage" placeholder="Dosage" />
        <input name="stock_remaining" type="number" placeholder="Stock" />
        <input name="units_per_day" type="number" min="0" placeholder="Per day" />
        <button type="submit">Add</button>
      </form>
    </section>

    <section class="card">
      <h2>Routines <span id="routine-summary" class="meta"></span></h2>
      <div id="routines"></div>
      <form id="routine-form" class="row">
        <input name="name" placeholder="New routine" required />
        <select name="category">
          <option value="morning">Morning</option>
          <option value="noon">Noon</option>
          <option value="evening">Evening</option>
          <option value="flexible">Flexible</option>
        </select>
        <button type="submit">Add</button>
      </form>
    </section>

    <section class="card">
      <h2>Water <span id="water-summary" class="meta"></span></h2>
      <div class="bar"><div id="water-bar" style="width: 0%"></div></div>
      <div class="row">
        <button type="button" data-water="250">+250 ml</button>
        <button type="button" data-water="500">+500 ml</button>
        <button type="button" data-water="-250">-250 ml</button>
      </div>
    </section>

    <section class="card">
      <h2>Mood</h2>
      <div id="mood" class="row"></div>
    </section>

    <p id="status" class="status"></p>
  </main>

  <script>
    const statusEl = document.getElementById('status');
    const setStatus = (message) => {
      statusEl.textContent = message || '';
    };

    const api = async (method, url, body) => {
      const res = await fetch(url, {
        method,
        headers: body ? { 'content-type': 'application/json' } : {},
        body: body ? JSON.stringify(body) : undefined
      });
      if (!res.ok) {
        const msg = await res.text();
        throw new Error(msg || 'Request failed');
      }
      return res.status === 204 ? null : res.json();
    };

    const el = (tag, className, text) => {
      const node = document.createElement(tag);
      if (className) node.className = className;
      if (text !== undefined) node.textContent = text;
      return node;
    };

    const renderItem = (kind, item) => {
      const row = el('div', item.done_today ? 'item done' : 'item');
      const left = el('div');
      left.appendChild(el('div', 'name', item.name));
      const details = [];
      if (item.dosage) details.push(item.dosage);
      if (item.inventory) {
        details.push(`${item.inventory.stock_remaining} left, ${item.inventory.days_remaining} days`);
      }
      if (details.length) left.appendChild(el('div', 'meta', details.join(' · ')));
      row.appendChild(left);

      const right = el('div', 'row');
      if (item.inventory && item.inventory.status !== 'normal') {
        right.appendChild(el('span', `badge ${item.inventory.status}`,
          item.inventory.status === 'empty' ? 'refill' : 'low'));
      }
      if (item.streak > 0) right.appendChild(el('span', 'meta', `${item.streak} day streak`));
      const remove = el('button', '', 'Delete');
      remove.type = 'button';
      remove.addEventListener('click', (event) => {
        event.stopPropagation();
        if (!confirm(`Delete ${item.name}?`)) return;
        api('DELETE', `/api/items/${kind}/${item.id}`).catch((err) => setStatus(err.message));
      });
      right.appendChild(remove);
      row.appendChild(right);

      row.addEventListener('click', () => {
        api('POST', `/api/items/${kind}/${item.id}/toggle`).catch((err) => setStatus(err.message));
      });
      return row;
    };

    const render = (dashboard) => {
      document.getElementById('date').textContent = dashboard.date;

      const supps = document.getElementById('supplements');
      supps.replaceChildren(...dashboard.supplements.items.map((item) => renderItem('supplements', item)));
      document.getElementById('supp-summary').textContent =
        `${dashboard.supplements.done}/${dashboard.supplements.total} · all-done streak ${dashboard.supplements.collective_streak}`;

      const routines = document.getElementById('routines');
      routines.replaceChildren();
      dashboard.routines.groups.forEach((group) => {
        routines.appendChild(el('h3', '', group.time_of_day));
        group.items.forEach((item) => routines.appendChild(renderItem('routines', item)));
      });
      document.getElementById('routine-summary').textContent =
        `${dashboard.routines.done}/${dashboard.routines.total} · all-done streak ${dashboard.routines.collective_streak}`;

      const water = dashboard.water;
      document.getElementById('water-bar').style.width = `${water.progress_percent}%`;
      document.getElementById('water-summary').textContent =
        `${water.liquid_volume_ml} / ${water.goal_ml} ml · streak ${water.streak.displayed}`;

      const mood = document.getElementById('mood');
      mood.replaceChildren(...[1, 2, 3, 4, 5].map((level) => {
        const button = el('button', dashboard.mood_level === level ? 'active' : '', String(level));
        button.type = 'button';
        button.addEventListener('click', () => {
          const next = dashboard.mood_level === level ? null : level;
          api('POST', '/api/mood', { level: next }).catch((err) => setStatus(err.message));
        });
        return button;
      }));
    };

    const formPayload = (form) => {
      const payload = {};
      new FormData(form).forEach((value, key) => {
        if (value === '') return;
        payload[key] = ['stock_remaining', 'units_per_day'].includes(key) ? Number(value) : value;
      });
      return payload;
    };

    const bindForm = (id, kind) => {
      const form = document.getElementById(id);
      form.addEventListener('submit', (event) => {
        event.preventDefault();
        api('POST', `/api/items/${kind}`, formPayload(form))
          .then(() => form.reset())
          .catch((err) => setStatus(err.message));
      });
    };

    bindForm('supp-form', 'supplements');
    bindForm('routine-form', 'routines');

    document.querySelectorAll('[data-water]').forEach((button) => {
      button.addEventListener('click', () => {
        api('POST', '/api/water', { delta_ml: Number(button.dataset.water) })
          .catch((err) => setStatus(err.message));
      });
    });

    document.getElementById('theme-toggle').addEventListener('click', () => {
      const dark = document.documentElement.dataset.theme !== 'dark';
      api('PUT', '/api/settings', { dark_mode: dark })
        .then((prefs) => {
          document.documentElement.dataset.theme = prefs.dark_mode ? 'dark' : 'light';
        })
        .catch((err) => setStatus(err.message));
    });

    const events = new EventSource('/api/events');
    events.addEventListener('dashboard', (event) => {
      setStatus('');
      render(JSON.parse(event.data));
    });
    events.onerror = () => setStatus('Reconnecting...');

    api('GET', '/api/dashboard').then(render).catch((err) => setStatus(err.message));
  </script>
</body>
</html>
"#;
