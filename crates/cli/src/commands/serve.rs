//! `tierline serve`: Start the HTTP API.

use tierline_config::AppConfig;

pub async fn run(port: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = AppConfig::load()?;

    if let Some(p) = port {
        config.gateway.port = p;
    }

    if !config.has_api_key() {
        eprintln!("❌ No API key configured.");
        eprintln!("   Set TIERLINE_API_KEY or add api_key to ~/.tierline/config.toml");
        std::process::exit(1);
    }

    println!("🚀 Tierline API server");
    println!(
        "   Listening on http://{}:{}",
        config.gateway.host, config.gateway.port
    );
    println!("   Agents:  {}", config.agents.len());
    println!("   Storage: {}", config.storage.backend);
    println!();
    println!("   Endpoints:");
    println!("     GET  /health");
    println!("     POST /v1/chat");
    println!("     GET  /v1/sessions/{{id}}/history?company_id=");
    println!("     GET  /v1/sessions/{{id}}/summary?company_id=");
    println!("     GET  /v1/escalations");
    println!("     POST /v1/escalations");
    println!("     GET  /v1/escalations/{{id}}");
    println!("     POST /v1/escalations/{{id}}/assign|start|resolve|close|messages");
    println!();

    tierline_gateway::start(config).await
}
