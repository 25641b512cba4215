//! Binary entrypoint for the `navbar` command-line tools.
use std::{
    fs,
    path::{Path, PathBuf},
    process,
};

use clap::{Parser, Subcommand};
use config::{TemplateRegistry, load_registry_from_path};
use navbar_engine::{Navbar, NavbarOptions};
use serde_json::{Map, Value, json};
use template::{HostContext, NavbarState, TemplateContext, TemplateEvaluator, wrap_template};
use tokio::sync::mpsc;
use tracing::debug;

#[derive(Parser, Debug)]
#[command(name = "navbar", about = "Check, render and patch navbar configurations", version)]
/// Command-line interface for the `navbar` binary.
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// JSON file of named configuration templates
    #[arg(long, global = true)]
    templates: Option<PathBuf>,

    #[command(flatten)]
    log: logging::LogArgs,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate a configuration file
    Check {
        /// Path to the configuration JSON
        path: PathBuf,
        /// Print the resolved configuration
        #[arg(long)]
        dump: bool,
    },
    /// Resolve routes and layout against a host snapshot and print them as JSON
    Render {
        /// Path to the configuration JSON
        path: PathBuf,
        /// Host context JSON (`states`, `user`, ...)
        #[arg(long)]
        host: Option<PathBuf>,
        /// Current dashboard path, used for route selection
        #[arg(long)]
        current_path: Option<String>,
        /// Viewport width in pixels
        #[arg(long, default_value_t = 1024)]
        width: u32,
    },
    /// Evaluate a single template, with or without delimiters
    Eval {
        /// Template text, e.g. "return states['sun.sun'].state"
        template: String,
        /// Host context JSON
        #[arg(long)]
        host: Option<PathBuf>,
        /// Evaluate as if on a desktop layout
        #[arg(long)]
        desktop: bool,
    },
    /// Deep-merge a patch file and/or path edits into a configuration and print the result
    Merge {
        /// Base configuration JSON
        base: PathBuf,
        /// Patch JSON merged over the base
        patch: Option<PathBuf>,
        /// Set `PATH=JSON` (e.g. routes.0.label="Home"); repeatable
        #[arg(long = "set", value_name = "PATH=JSON")]
        set: Vec<String>,
        /// Remove the key at PATH; repeatable
        #[arg(long = "unset", value_name = "PATH")]
        unset: Vec<String>,
    },
}

fn main() {
    let cli = Cli::parse();
    logging::init(&cli.log);

    let registry = match &cli.templates {
        Some(p) => load_registry_from_path(p).unwrap_or_else(|e| fail(&e.pretty())),
        None => TemplateRegistry::new(),
    };

    match cli.command {
        Command::Check { path, dump } => check(&path, &registry, dump),
        Command::Render {
            path,
            host,
            current_path,
            width,
        } => render(&path, &registry, host.as_deref(), current_path, width),
        Command::Eval {
            template,
            host,
            desktop,
        } => eval(&template, host.as_deref(), desktop),
        Command::Merge {
            base,
            patch,
            set,
            unset,
        } => merge(&base, patch.as_deref(), &set, &unset),
    }
}

/// Print `msg` to stderr and exit with status 1.
fn fail(msg: &str) -> ! {
    eprintln!("{}", msg);
    process::exit(1)
}

fn read_json(path: &Path) -> Value {
    let source = fs::read_to_string(path).unwrap_or_else(|e| {
        fail(&format!("Read error at {}: {}", path.display(), e));
    });
    serde_json::from_str(&source)
        .unwrap_or_else(|e| fail(&config::Error::from_json(&source, &e, Some(path)).pretty()))
}

fn read_host(path: Option<&Path>) -> HostContext {
    let Some(path) = path else {
        return HostContext::default();
    };
    serde_json::from_value(read_json(path))
        .unwrap_or_else(|e| fail(&format!("Invalid host context {}: {}", path.display(), e)))
}

fn print_json(value: &Value) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{}", s),
        Err(e) => fail(&format!("Could not serialize output: {}", e)),
    }
}

fn check(path: &Path, registry: &TemplateRegistry, dump: bool) {
    let cfg = config::load_from_path(path, registry).unwrap_or_else(|e| fail(&e.pretty()));
    if dump {
        match serde_json::to_value(&cfg) {
            Ok(v) => print_json(&v),
            Err(e) => fail(&format!("Could not serialize config: {}", e)),
        }
    } else {
        let popups: usize = cfg.routes.iter().map(|r| r.popup_items().len()).sum();
        println!(
            "{}: ok ({} routes, {} popup items)",
            path.display(),
            cfg.routes.len(),
            popups
        );
    }
}

fn render(
    path: &Path,
    registry: &TemplateRegistry,
    host: Option<&Path>,
    current_path: Option<String>,
    width: u32,
) {
    // Rendering never runs actions; effects are discarded.
    let (tx, _rx) = mpsc::unbounded_channel();
    let navbar = Navbar::new(
        TemplateEvaluator::default(),
        NavbarOptions {
            registry: registry.clone(),
            ..NavbarOptions::default()
        },
        tx,
    );
    let cfg = config::load_from_path(path, registry).unwrap_or_else(|e| fail(&e.pretty()));
    navbar.install(cfg);
    navbar.set_host_context(read_host(host));
    navbar.set_current_path(current_path);

    let rendered = (|| -> navbar_engine::Result<Value> {
        navbar.set_viewport_width(width)?;
        let routes = navbar.resolve_routes()?;
        let mut popups = Map::new();
        for r in routes.iter().filter(|r| r.popup_items > 0) {
            let items = navbar.resolve_popup(r.item.element.route)?;
            popups.insert(r.item.element.route.to_string(), json!(items));
        }
        Ok(json!({
            "layout": navbar.resolve_layout()?,
            "routes": routes,
            "popups": popups,
        }))
    })()
    .unwrap_or_else(|e| fail(&e.to_string()));
    debug!(stats = ?navbar.evaluator().cache().stats(), "template cache");
    print_json(&rendered);
}

fn eval(text: &str, host: Option<&Path>, desktop: bool) {
    let ctx = TemplateContext::new(&read_host(host), NavbarState { is_desktop: desktop });
    let evaluator = TemplateEvaluator::default();
    match evaluator.try_evaluate(&ctx, &wrap_template(text)) {
        Ok(Some(v)) => print_json(&v),
        Ok(None) => fail("template did not return a value"),
        Err(e) => fail(&format!("template failed: {}", e)),
    }
}

fn merge(base: &Path, patch: Option<&Path>, set: &[String], unset: &[String]) {
    let mut merged = read_json(base);
    if let Some(p) = patch {
        merged = config::merge_values(&merged, &read_json(p));
    }
    for edit in set {
        let Some((path, raw)) = edit.split_once('=') else {
            fail(&format!("--set expects PATH=JSON, got {edit:?}"));
        };
        // Bare words are taken as strings.
        let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
        merged = config::set_path(&merged, path, &value).unwrap_or_else(|e| fail(&e.pretty()));
    }
    for path in unset {
        merged = config::remove_path(&merged, path).unwrap_or_else(|e| fail(&e.pretty()));
    }
    print_json(&merged);
}
