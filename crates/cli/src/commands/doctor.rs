//! `tierline doctor`: Diagnose configuration health.

use std::path::Path;
use tierline_config::AppConfig;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    println!("🩺 Tierline Doctor: System Diagnostics");
    println!("======================================\n");

    let config_path = AppConfig::config_dir().join("config.toml");
    if !config_path.exists() {
        println!("  ⚠️  No config file at {}, using defaults", config_path.display());
        println!("     Run `tierline config --default > {}`", config_path.display());
    }

    let issues = match AppConfig::load() {
        Ok(config) => {
            println!("  ✅ Config valid");
            let findings = check(&config);
            for finding in &findings {
                println!("  {finding}");
            }
            findings.iter().filter(|f| !f.is_ok()).count()
        }
        Err(e) => {
            println!("  ❌ Config invalid: {e}");
            1
        }
    };

    // Summary
    println!();
    if issues == 0 {
        println!("  🎉 All checks passed!");
    } else {
        println!("  ⚠️  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}

#[derive(Debug, PartialEq)]
enum Finding {
    Ok(String),
    Warn(String),
    Fail(String),
}

impl Finding {
    fn is_ok(&self) -> bool {
        matches!(self, Finding::Ok(_))
    }
}

impl std::fmt::Display for Finding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Finding::Ok(m) => write!(f, "✅ {m}"),
            Finding::Warn(m) => write!(f, "⚠️  {m}"),
            Finding::Fail(m) => write!(f, "❌ {m}"),
        }
    }
}

fn check(config: &AppConfig) -> Vec<Finding> {
    let mut out = Vec::new();

    if config.has_api_key() {
        out.push(Finding::Ok(format!(
            "API key configured ({} / {})",
            config.llm.provider, config.llm.model
        )));
    } else {
        out.push(Finding::Fail(
            "No API key: set TIERLINE_API_KEY or api_key in config.toml".into(),
        ));
    }

    if config.agents.is_empty() {
        out.push(Finding::Warn("No agents configured".into()));
    } else {
        out.push(Finding::Ok(format!("{} agent(s) configured", config.agents.len())));
    }

    let registry = tierline_tools::default_registry();
    for agent in &config.agents {
        for tool in &agent.enabled_tools {
            if registry.get(tool).is_none() {
                out.push(Finding::Warn(format!(
                    "Agent '{}' enables unknown tool '{tool}'",
                    agent.id
                )));
            }
        }
    }

    if config.human_agents.is_empty() {
        out.push(Finding::Warn(
            "No human agents: escalations will stay unassigned".into(),
        ));
    } else {
        out.push(Finding::Ok(format!(
            "{} human agent(s) on the roster",
            config.human_agents.len()
        )));
    }

    match &config.knowledge.documents_file {
        Some(path) if Path::new(path).exists() => {
            out.push(Finding::Ok(format!("Knowledge file found: {path}")))
        }
        Some(path) => out.push(Finding::Fail(format!("Knowledge file missing: {path}"))),
        None => out.push(Finding::Warn(
            "No knowledge file: answers will rely on live sources only".into(),
        )),
    }

    out
}
