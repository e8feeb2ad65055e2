//! Finite, ordered registry of build steps.
//!
//! Each step is a self-contained write to the working tree that returns the
//! commit message for its result. Steps are intended to run at most once each,
//! in order, but that is a documented contract rather than a runtime
//! invariant: re-running an index after an external progress reset must
//! produce the same files again (idempotent files, not idempotent history).
//!
//! The built-in registry scaffolds "Driftline", a small offline social app:
//! page shell, styling, and a handful of frontend modules.

use std::path::Path;

use anyhow::{Context, Result, anyhow};

use crate::io::workspace::{append_file, write_file};

type StepFn = Box<dyn Fn(&Path) -> Result<String> + Send + Sync>;

/// A named unit of generative work.
pub struct Step {
    name: &'static str,
    run: StepFn,
}

impl Step {
    pub fn new(
        name: &'static str,
        run: impl Fn(&Path) -> Result<String> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name,
            run: Box::new(run),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

/// Ordered, finite sequence of build steps.
pub struct StepRegistry {
    steps: Vec<Step>,
}

impl StepRegistry {
    pub fn from_steps(steps: Vec<Step>) -> Self {
        Self { steps }
    }

    /// The built-in Driftline scaffold.
    pub fn builtin() -> Self {
        Self::from_steps(vec![
            Step::new("page shell", step_page_shell),
            Step::new("base stylesheet", step_stylesheet),
            Step::new("app bootstrap", step_app_bootstrap),
            Step::new("auth module", step_auth),
            Step::new("feed module", step_feed),
            Step::new("profile module", step_profile),
            Step::new("project config", step_project_config),
            Step::new("readme", step_readme),
        ])
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Name of the step at `index`, if in range.
    pub fn name(&self, index: usize) -> Option<&'static str> {
        self.steps.get(index).map(Step::name)
    }

    /// Execute the step at `index` against `root`, returning its commit message.
    pub fn run(&self, root: &Path, index: usize) -> Result<String> {
        let step = self
            .steps
            .get(index)
            .ok_or_else(|| anyhow!("step index {index} out of range (size {})", self.len()))?;
        let message = (step.run)(root).with_context(|| format!("run step '{}'", step.name))?;
        if message.trim().is_empty() {
            return Err(anyhow!("step '{}' returned an empty commit message", step.name));
        }
        Ok(message)
    }
}

fn step_page_shell(root: &Path) -> Result<String> {
    write_file(
        root,
        "index.html",
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Driftline</title>
    <link rel="stylesheet" href="css/style.css">
</head>
<body>
    <header class="topbar">
        <h1 class="logo">Driftline</h1>
        <nav id="nav"></nav>
    </header>
    <main id="view"></main>
    <script src="js/app.js"></script>
</body>
</html>
"#,
    )?;
    Ok("Create index.html with app shell and navigation slots".to_string())
}

fn step_stylesheet(root: &Path) -> Result<String> {
    write_file(
        root,
        "css/style.css",
        r#"/* Driftline base styles */
:root {
    --accent: #4a90d9;
    --bg: #f0f2f5;
    --card: #ffffff;
    --text: #1c1e21;
}

* { box-sizing: border-box; margin: 0; padding: 0; }

body {
    font-family: -apple-system, "Segoe UI", Roboto, sans-serif;
    background: var(--bg);
    color: var(--text);
}

.topbar {
    display: flex;
    align-items: center;
    justify-content: space-between;
    padding: 12px 20px;
    background: var(--accent);
    color: white;
}

.card {
    background: var(--card);
    border-radius: 8px;
    padding: 16px;
    margin-bottom: 12px;
    box-shadow: 0 1px 2px rgba(0, 0, 0, 0.1);
}
"#,
    )?;
    Ok("Add base stylesheet with theme variables and card layout".to_string())
}

fn step_app_bootstrap(root: &Path) -> Result<String> {
    write_file(
        root,
        "js/app.js",
        r#"// Driftline - App bootstrap and view router
const App = {
    routes: {},

    register(name, render) {
        this.routes[name] = render;
    },

    navigate(name) {
        const render = this.routes[name];
        const view = document.getElementById("view");
        if (render && view) {
            view.innerHTML = render();
        }
        localStorage.setItem("dl_route", name);
    },

    start() {
        const last = localStorage.getItem("dl_route") || "feed";
        this.navigate(this.routes[last] ? last : "feed");
    }
};

document.addEventListener("DOMContentLoaded", () => App.start());
"#,
    )?;
    Ok("Add app bootstrap with localStorage-backed view router".to_string())
}

fn step_auth(root: &Path) -> Result<String> {
    write_file(
        root,
        "js/auth.js",
        r#"// Driftline - Local auth with session storage
const Auth = {
    currentUser() {
        return JSON.parse(sessionStorage.getItem("dl_user") || "null");
    },

    login(name) {
        const user = { name: name, joined: new Date().toISOString() };
        sessionStorage.setItem("dl_user", JSON.stringify(user));
        return user;
    },

    logout() {
        sessionStorage.removeItem("dl_user");
    },

    requireUser() {
        return this.currentUser() || this.login("guest");
    }
};
"#,
    )?;
    append_file(
        root,
        "css/style.css",
        r#"
/* Auth */
.login-form { max-width: 320px; margin: 40px auto; }
.login-form input { width: 100%; padding: 10px; margin-bottom: 8px; }
"#,
    )?;
    Ok("Add local auth module with session storage".to_string())
}

fn step_feed(root: &Path) -> Result<String> {
    write_file(
        root,
        "js/feed.js",
        r#"// Driftline - Feed with posts, likes, and comments
const Feed = {
    posts() {
        return JSON.parse(localStorage.getItem("dl_posts") || "[]");
    },

    save(posts) {
        localStorage.setItem("dl_posts", JSON.stringify(posts));
    },

    addPost(author, content) {
        const posts = this.posts();
        posts.unshift({
            id: Date.now(),
            author: author,
            content: content,
            likes: 0,
            comments: []
        });
        this.save(posts);
    },

    toggleLike(id) {
        const posts = this.posts();
        const post = posts.find(p => p.id === id);
        if (post) {
            post.likes += 1;
            this.save(posts);
        }
    },

    render() {
        return this.posts().map(p =>
            '<div class="card post">' +
            '<strong>' + p.author + '</strong>' +
            '<p>' + p.content + '</p>' +
            '<span class="likes">' + p.likes + ' likes</span>' +
            '</div>'
        ).join("");
    }
};

if (typeof App !== "undefined") {
    App.register("feed", () => Feed.render());
}
"#,
    )?;
    append_file(
        root,
        "css/style.css",
        r#"
/* Feed */
.post p { margin: 8px 0; }
.likes { font-size: 12px; color: #666; }
"#,
    )?;
    Ok("Add feed module with posts, likes, and comments".to_string())
}

fn step_profile(root: &Path) -> Result<String> {
    write_file(
        root,
        "js/profile.js",
        r#"// Driftline - Profile page with bio and stats
const Profile = {
    render() {
        const user = Auth.requireUser();
        const posts = Feed.posts().filter(p => p.author === user.name);
        return '<div class="card profile">' +
            '<h2>' + user.name + '</h2>' +
            '<p class="bio">Hello from Driftline.</p>' +
            '<div class="stats">' + posts.length + ' posts</div>' +
            '</div>';
    }
};

if (typeof App !== "undefined") {
    App.register("profile", () => Profile.render());
}
"#,
    )?;
    append_file(
        root,
        "css/style.css",
        r#"
/* Profile */
.profile h2 { margin-bottom: 4px; }
.stats { font-size: 13px; color: #888; }
"#,
    )?;
    Ok("Add profile page with bio and post stats".to_string())
}

fn step_project_config(root: &Path) -> Result<String> {
    write_file(
        root,
        ".gitignore",
        "node_modules/\n*.log\n.DS_Store\n",
    )?;
    write_file(
        root,
        "package.json",
        r#"{
  "name": "driftline",
  "version": "1.0.0",
  "description": "A small offline social app",
  "scripts": {
    "serve": "python3 -m http.server 8000"
  }
}
"#,
    )?;
    Ok("Add .gitignore, package.json, and project configuration".to_string())
}

fn step_readme(root: &Path) -> Result<String> {
    write_file(
        root,
        "README.md",
        r#"# Driftline

A small social app that runs fully offline.

## Features
- News feed with posts, likes, and comments
- Local auth with session storage
- User profiles with post stats

## Getting Started
Open `index.html` in a browser, or run `npm run serve`.
"#,
    )?;
    Ok("Add README with feature overview".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_registry_has_ordered_named_steps() {
        let registry = StepRegistry::builtin();
        assert!(!registry.is_empty());
        assert_eq!(registry.name(0), Some("page shell"));
        assert_eq!(registry.name(registry.len() - 1), Some("readme"));
        assert_eq!(registry.name(registry.len()), None);
    }

    #[test]
    fn out_of_range_index_is_an_error() {
        let registry = StepRegistry::builtin();
        let err = registry
            .run(Path::new("/nonexistent"), registry.len())
            .expect_err("out of range");
        assert!(err.to_string().contains("out of range"));
    }

    #[test]
    fn every_builtin_step_writes_files_and_returns_a_message() {
        let temp = tempfile::tempdir().expect("tempdir");
        let registry = StepRegistry::builtin();
        for index in 0..registry.len() {
            let message = registry.run(temp.path(), index).expect("run step");
            assert!(!message.trim().is_empty(), "step {index} message empty");
        }
        assert!(temp.path().join("index.html").exists());
        assert!(temp.path().join("css/style.css").exists());
        assert!(temp.path().join("js/feed.js").exists());
        assert!(temp.path().join("package.json").exists());
    }

    #[test]
    fn rerunning_a_step_regenerates_identical_primary_file() {
        let temp = tempfile::tempdir().expect("tempdir");
        let registry = StepRegistry::builtin();
        registry.run(temp.path(), 0).expect("run");
        let first = std::fs::read_to_string(temp.path().join("index.html")).expect("read");
        registry.run(temp.path(), 0).expect("rerun");
        let second = std::fs::read_to_string(temp.path().join("index.html")).expect("read");
        assert_eq!(first, second);
    }

    #[test]
    fn empty_commit_message_is_rejected() {
        let registry = StepRegistry::from_steps(vec![Step::new("blank", |_| Ok(String::new()))]);
        let temp = tempfile::tempdir().expect("tempdir");
        let err = registry.run(temp.path(), 0).expect_err("empty message");
        assert!(err.to_string().contains("empty commit message"));
    }
}
