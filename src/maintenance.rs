//! Cyclic maintenance actions for the unbounded phase.
//!
//! Once the finite registry is exhausted the loop never terminates; it
//! rotates through this fixed action set forever. Every action embeds the
//! monotonically increasing maintenance version into what it writes, so
//! revisiting the same cycle index at a higher version still changes bytes
//! and the commit is never spuriously empty. Each run also bumps the
//! generated project's manifest version to `1.0.<version>`.

use std::path::Path;

use anyhow::{Context, Result, anyhow};

use crate::io::workspace::{append_file, bump_manifest_version, write_file};

pub type ActionFn = fn(&Path, u64) -> Result<String>;

/// A named cyclic maintenance action.
pub struct MaintenanceAction {
    name: &'static str,
    run: ActionFn,
}

impl MaintenanceAction {
    pub fn new(name: &'static str, run: ActionFn) -> Self {
        Self { name, run }
    }
}

/// Fixed, cyclic set of maintenance actions.
pub struct MaintenanceRotator {
    actions: Vec<MaintenanceAction>,
}

impl MaintenanceRotator {
    pub fn from_actions(actions: Vec<MaintenanceAction>) -> Self {
        Self { actions }
    }

    pub fn builtin() -> Self {
        Self::from_actions(vec![
            MaintenanceAction {
                name: "analytics module",
                run: maint_analytics,
            },
            MaintenanceAction {
                name: "performance monitor",
                run: maint_perf_monitor,
            },
            MaintenanceAction {
                name: "animation refresh",
                run: maint_css_animations,
            },
            MaintenanceAction {
                name: "keyboard shortcuts",
                run: maint_keyboard_shortcuts,
            },
            MaintenanceAction {
                name: "readme refresh",
                run: maint_update_readme,
            },
        ])
    }

    /// Number of actions in one full cycle.
    pub fn cycle_len(&self) -> usize {
        self.actions.len()
    }

    /// Name of the action at `cycle_index`, if in range.
    pub fn name(&self, cycle_index: usize) -> Option<&'static str> {
        self.actions.get(cycle_index).map(|action| action.name)
    }

    /// Run the action at `cycle_index` for the given version, then bump the
    /// manifest version. Returns the commit message.
    pub fn run(&self, root: &Path, version: u64, cycle_index: usize) -> Result<String> {
        let action = self.actions.get(cycle_index).ok_or_else(|| {
            anyhow!(
                "maintenance cycle index {cycle_index} out of range (cycle {})",
                self.cycle_len()
            )
        })?;
        let message = (action.run)(root, version)
            .with_context(|| format!("run maintenance '{}'", action.name))?;
        bump_manifest_version(root, version)?;
        Ok(message)
    }
}

fn maint_analytics(root: &Path, version: u64) -> Result<String> {
    write_file(
        root,
        "js/analytics.js",
        &format!(
            r#"// Driftline - Local analytics v{version}
const Analytics = {{
    track(event, data) {{
        const log = JSON.parse(localStorage.getItem("dl_analytics") || "[]");
        log.push({{ event: event, data: data || {{}}, at: new Date().toISOString() }});
        if (log.length > 200) log.splice(0, log.length - 200);
        localStorage.setItem("dl_analytics", JSON.stringify(log));
    }},

    summary() {{
        const log = JSON.parse(localStorage.getItem("dl_analytics") || "[]");
        const counts = {{}};
        log.forEach(e => {{ counts[e.event] = (counts[e.event] || 0) + 1; }});
        return counts;
    }}
}};
"#
        ),
    )?;
    Ok(format!("Add local analytics module v{version}"))
}

fn maint_perf_monitor(root: &Path, version: u64) -> Result<String> {
    write_file(
        root,
        "js/perf.js",
        &format!(
            r#"// Driftline - Performance monitor v{version}
const Perf = {{
    marks: {{}},

    start(label) {{
        this.marks[label] = performance.now();
    }},

    end(label) {{
        const started = this.marks[label];
        if (started === undefined) return null;
        const elapsed = performance.now() - started;
        delete this.marks[label];
        console.debug("[Driftline perf]", label, elapsed.toFixed(1) + "ms");
        return elapsed;
    }}
}};
"#
        ),
    )?;
    Ok(format!("Add render performance monitor v{version}"))
}

fn maint_css_animations(root: &Path, version: u64) -> Result<String> {
    append_file(
        root,
        "css/style.css",
        &format!(
            r#"
/* Animation pass v{version} */
.card {{ transition: box-shadow 0.15s ease; }}
.card:hover {{ box-shadow: 0 2px 6px rgba(0, 0, 0, 0.15); }}
"#
        ),
    )?;
    Ok(format!("Refresh card hover animations v{version}"))
}

fn maint_keyboard_shortcuts(root: &Path, version: u64) -> Result<String> {
    write_file(
        root,
        "js/shortcuts.js",
        &format!(
            r#"// Driftline - Keyboard shortcuts v{version}
const Shortcuts = {{
    bindings: {{
        "f": () => App.navigate("feed"),
        "p": () => App.navigate("profile")
    }},

    install() {{
        document.addEventListener("keydown", (event) => {{
            if (event.target.tagName === "INPUT" || event.target.tagName === "TEXTAREA") return;
            const handler = this.bindings[event.key];
            if (handler) handler();
        }});
    }}
}};

Shortcuts.install();
"#
        ),
    )?;
    Ok(format!("Add keyboard shortcuts for navigation v{version}"))
}

fn maint_update_readme(root: &Path, version: u64) -> Result<String> {
    write_file(
        root,
        "README.md",
        &format!(
            r#"# Driftline v1.0.{version}

A small social app that runs fully offline.

## Features
- News feed with posts, likes, and comments
- Local auth with session storage
- User profiles with post stats
- Local analytics and performance monitoring
- Keyboard shortcuts

## Getting Started
Open `index.html` in a browser, or run `npm run serve`.
"#
        ),
    )?;
    Ok(format!("Update README with full feature list v{version}"))
}
