//! `tierline chat`: Talk to one agent from the terminal.

use std::io::Write;
use tierline_agent::{Runtime, TurnReply, TurnRequest};
use tierline_config::AppConfig;
use tokio::io::{AsyncBufReadExt, BufReader};

/// Who the terminal user is talking to.
pub struct ChatTarget {
    pub agent_id: String,
    pub company_id: String,
    pub user_id: String,
    pub session_id: Option<String>,
}

pub async fn run(
    mut target: ChatTarget,
    message: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;

    if !config.has_api_key() {
        eprintln!("❌ No API key configured.");
        eprintln!("   Set TIERLINE_API_KEY or add api_key to ~/.tierline/config.toml");
        std::process::exit(1);
    }

    let runtime = Runtime::from_config(config).await?;

    if let Some(msg) = message {
        let reply = send(&runtime, &target, msg).await?;
        println!("{}", reply.reply);
        print_details(&reply);
        return Ok(());
    }

    println!("🎧 Tierline chat with '{}' ({})", target.agent_id, target.company_id);
    println!("   Type your message and press Enter. Type 'exit' or Ctrl+C to quit.\n");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("  You > ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if matches!(line, "exit" | "quit") {
            break;
        }

        match send(&runtime, &target, line.to_string()).await {
            Ok(reply) => {
                target.session_id = Some(reply.session_id.clone());
                println!();
                for text in reply.reply.lines() {
                    println!("  Agent > {text}");
                }
                print_details(&reply);
                println!();
            }
            Err(e) => eprintln!("  ❌ {e}\n"),
        }
    }

    if let Some(session) = &target.session_id {
        println!("   Session: {session}");
    }
    println!("👋 Goodbye!");
    Ok(())
}

async fn send(
    runtime: &Runtime,
    target: &ChatTarget,
    message: String,
) -> tierline_core::error::Result<TurnReply> {
    let mut request = TurnRequest::new(
        &target.agent_id,
        &target.company_id,
        &target.user_id,
        message,
    );
    if let Some(session) = &target.session_id {
        request = request.in_session(session);
    }
    runtime.orchestrator.handle_turn(request).await
}

fn print_details(reply: &TurnReply) {
    let meta = &reply.metadata;
    println!(
        "          [{} confidence, score {:.2}, {} passage(s){}]",
        reply.confidence_tier,
        meta.confidence_score,
        meta.passage_count,
        if meta.fallback_used { ", live fallback" } else { "" },
    );
    if let Some(tool) = &meta.executed_tool {
        println!("          [tool: {tool}]");
    }
    if let Some(esc) = &reply.escalation {
        let who = esc.assigned_agent.as_deref().unwrap_or("unassigned");
        println!(
            "          [escalated {} ({} priority, {who}): {}]",
            esc.id, esc.priority, esc.reason
        );
    }
}
