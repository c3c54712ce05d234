use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use voicemail_client::{VoicemailClient, VoicemailError};

const USAGE: &str = "usage: voicemail-agent <audio_url> <webhook_url> [--priority]";

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,voicemail_client=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let priority = args.iter().any(|a| a == "--priority");
    let positional: Vec<&str> = args
        .iter()
        .filter(|a| !a.starts_with("--"))
        .map(String::as_str)
        .collect();
    let (audio_url, webhook_url) = match positional.as_slice() {
        [audio, webhook] => (*audio, *webhook),
        _ => {
            eprintln!("{USAGE}");
            std::process::exit(2);
        }
    };

    if let Err(e) = run(audio_url, webhook_url, priority).await {
        eprintln!("ERROR [{}]: {e}", e.code());
        if let Some(proof) = e.payment_sent() {
            eprintln!("  payment was sent: tx {} ({})", proof.signature, proof.token);
            eprintln!("  resubmit with this proof instead of paying again.");
        }
        std::process::exit(1);
    }
}

async fn run(audio_url: &str, webhook_url: &str, priority: bool) -> Result<(), VoicemailError> {
    let client = VoicemailClient::from_env()?;

    let health = client.health().await?;
    if !health.is_operational() {
        tracing::warn!(status = ?health.status, "service does not report operational");
    }

    let price = client.quote(priority).await?;
    let symbol = &client.config().ledger.token_symbol;
    println!("AgentVoicemail client");
    println!("  Endpoint: {}", client.config().endpoint);
    println!("  Agent:    {}", client.address());
    println!("  Price:    {price} {symbol}{}", if priority { " (priority)" } else { "" });
    match client.balance().await {
        Ok(balance) => println!("  Balance:  {balance} {symbol}"),
        Err(e) => println!("  Balance:  unavailable ({e})"),
    }

    let result = client
        .process_voicemail(audio_url, webhook_url, priority)
        .await?;
    if let Some(proof) = &result.payment {
        println!("\nPaid: {}", client.config().ledger.tx_url(&proof.signature));
    } else if result.free_tier {
        println!("\nFree tier ({} remaining)", result.remaining_free);
    }

    let Some(job_id) = result.job_id.as_deref() else {
        println!("Accepted; results will be delivered to {webhook_url}");
        return Ok(());
    };
    println!("Job {job_id} {:?}, waiting for completion...", result.status);

    let done = client.wait_for_completion(job_id).await?;
    match done.transcription() {
        Some(text) => println!("\nTranscription:\n{text}"),
        None => println!("\nCompleted: {}", done.result.unwrap_or_default()),
    }
    Ok(())
}
