//! Finsight command implementations

use anyhow::{Context, Result};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use finsight_agents::{AgentsApi, AssistantsClient, MessageContent};
use finsight_capability::{CallDefaults, CapabilityClient, ToolDispatcher};
use finsight_config::Config;
use finsight_docintel::DocIntelClient;
use finsight_session::{filing, provision, FilingMeta, FilingSession, RunConfig, SessionError};

/// Read line from stdin
fn read_line() -> String {
    let mut input = String::new();
    std::io::stdin().read_line(&mut input).unwrap();
    input.trim().to_string()
}

/// Read password from stdin (masked input)
fn read_password() -> String {
    rpassword::read_password().unwrap_or_else(|_| read_line())
}

/// Validate an API key by listing agents
async fn validate_api_key(api_base: &str, api_key: &str) -> bool {
    AssistantsClient::new(api_base, api_key)
        .list_agents()
        .await
        .is_ok()
}

/// Chat about one uploaded filing
pub async fn chat_command(file: String, question: Option<String>) -> Result<()> {
    let path = Path::new(&file);
    if !path.exists() {
        anyhow::bail!("File not found: {}", file);
    }
    if !filing::is_supported(path) {
        anyhow::bail!(
            "File extension '{}' is not supported. Supported types: {}",
            filing::extension(path),
            filing::SUPPORTED_EXTENSIONS.join(", ")
        );
    }
    let meta = FilingMeta::from_path(path)?;

    let config = Config::load().await?;
    let api_key = config
        .api_key()
        .context("No API key configured. Run 'finsight setup' or set FINSIGHT_API_KEY")?;

    let backend = Arc::new(AssistantsClient::new(config.api_base(), api_key));
    let capability_url = config.capability_url();

    let capability = CapabilityClient::new(&capability_url);
    let index = capability.discover_or_empty().await;
    if index.is_empty() {
        println!("◆ No tools discovered at {}", capability_url);
    } else {
        println!(
            "◆ Discovered {} tools: {}",
            index.len(),
            index.names().join(", ")
        );
    }

    let docintel = match (config.docintel_endpoint(), config.docintel_api_key()) {
        (Some(endpoint), Some(key)) => Some(DocIntelClient::new(endpoint, key)),
        _ => None,
    };

    let store = provision::ensure_store(backend.as_ref(), docintel.as_ref(), path, &meta).await?;
    let agent = provision::ensure_agent(
        backend.as_ref(),
        &index,
        &store,
        &meta,
        &config.model(),
        &config.user_prefix(),
        &capability_url,
    )
    .await?;

    println!(
        "◆ Chatting about '{}' with agent '{}' (store: '{}')",
        file, agent.name, store.name
    );

    let dispatcher = ToolDispatcher::new(
        capability,
        index,
        CallDefaults {
            ticker: meta.ticker.clone(),
        },
    );

    let cancel = CancellationToken::new();
    let signal_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            signal_token.cancel();
        }
    });

    let session = FilingSession::new(backend, dispatcher, agent.id, &meta, &capability_url)
        .with_sampling(config.run.temperature, config.run.top_p)
        .with_run_config(RunConfig {
            poll_interval: config.poll_interval(),
            max_polls: config.run.max_polls,
        })
        .with_cancellation(cancel);

    if let Some(q) = question {
        answer_question(&session, &q).await;
        return Ok(());
    }

    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("Enter a question (or 'exit' to quit):");

    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let mut input = String::new();
        if std::io::stdin().read_line(&mut input)? == 0 {
            break;
        }

        let input = input.trim();
        if input == "exit" || input == "quit" {
            break;
        }
        if input.is_empty() {
            println!("Please enter a valid question.");
            continue;
        }

        if !answer_question(&session, input).await {
            break;
        }
        println!("Enter another question (or 'exit' to quit):");
    }

    Ok(())
}

/// Run one question through the session and print the result. Returns
/// false when the session was cancelled.
async fn answer_question(session: &FilingSession, question: &str) -> bool {
    match session.ask(question).await {
        Ok(content) => {
            print_answer(&content);
            true
        }
        Err(SessionError::Cancelled) => {
            println!("\n◆ Cancelled");
            false
        }
        Err(e) => {
            println!("Error in chat loop: {}", e);
            true
        }
    }
}

fn print_answer(content: &[MessageContent]) {
    if content.is_empty() {
        println!("No response from the agent.");
        return;
    }
    println!();
    for item in content {
        match item {
            MessageContent::Text { text } => println!("◆ {}\n", text.value),
            MessageContent::ImageFile { image_file } => {
                println!("◆ <image from ID: {}>\n", image_file.file_id)
            }
        }
    }
}

/// List knowledge stores, or delete one by id
pub async fn stores_command(delete: Option<String>) -> Result<()> {
    let config = Config::load().await?;
    let api_key = config
        .api_key()
        .context("No API key configured. Run 'finsight setup' or set FINSIGHT_API_KEY")?;
    let backend = AssistantsClient::new(config.api_base(), api_key);

    if let Some(store_id) = delete {
        print!("Delete store {}? (y/N): ", store_id);
        std::io::stdout().flush()?;

        if read_line().to_lowercase() == "y" {
            backend.delete_vector_store(&store_id).await?;
            println!("✓ Store {} deleted", store_id);
        } else {
            println!("Aborted");
        }
        return Ok(());
    }

    let stores = backend.list_vector_stores().await?;

    println!("◆ Knowledge Stores");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    if stores.is_empty() {
        println!("No stores found");
    } else {
        for store in stores {
            let created = chrono::DateTime::from_timestamp(store.created_at, 0)
                .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_else(|| "unknown".to_string());
            println!("  {} - {} (created {})", store.id, store.name, created);
        }
    }

    Ok(())
}

/// Interactive setup wizard
pub async fn setup_command() -> Result<()> {
    println!("◆ Finsight Setup Wizard");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!();

    let mut config = Config::load().await.unwrap_or_default();

    // ========================================================
    // Step 1: Back-end connection
    // ========================================================
    println!("Step 1: Conversational Back End");
    println!();

    print!("API base [{}]: ", config.backend.api_base);
    std::io::stdout().flush()?;
    let api_base = read_line();
    if !api_base.is_empty() {
        config.backend.api_base = api_base;
    }

    let api_key = loop {
        print!("Enter your back-end API key: ");
        std::io::stdout().flush()?;
        let key = read_password();

        if key.is_empty() {
            println!("API key cannot be empty. Please try again.");
            continue;
        }

        print!("Validating API key... ");
        std::io::stdout().flush()?;

        if validate_api_key(&config.backend.api_base, &key).await {
            println!("✓ Valid!");
            break key;
        } else {
            println!("✗ Invalid");
            println!();
            print!("The API key appears to be invalid. Try again? (Y/n/skip): ");
            std::io::stdout().flush()?;
            let response = read_line().to_lowercase();

            if response == "skip" || response == "s" {
                println!(
                    "Skipping API key validation. You can set it later in ~/.finsight/config.json"
                );
                break key;
            } else if response == "n" || response == "no" {
                anyhow::bail!("Setup cancelled");
            }
            // Otherwise, loop and try again
        }
    };
    config.backend.api_key = api_key;
    println!();

    // ========================================================
    // Step 2: Capability server
    // ========================================================
    println!("Step 2: Capability Server");
    println!();

    print!("Capability server URL [{}]: ", config.capability_url());
    std::io::stdout().flush()?;
    let base_url = read_line();
    if !base_url.is_empty() {
        config.capability.base_url = base_url;
    }

    print!("Probing {} for tools... ", config.capability_url());
    std::io::stdout().flush()?;
    let index = CapabilityClient::new(config.capability_url())
        .discover_or_empty()
        .await;
    if index.is_empty() {
        println!("✗ No tools found (the server may not be running yet)");
    } else {
        println!("✓ Found {} tools", index.len());
    }
    println!();

    // ========================================================
    // Step 3: Document analysis (optional)
    // ========================================================
    println!("Step 3: Document Analysis (Optional)");
    println!("Needed to upload pdf and image filings.");
    println!();
    print!("Configure document analysis? (y/N): ");
    std::io::stdout().flush()?;

    if read_line().to_lowercase() == "y" {
        print!("Enter the analysis endpoint: ");
        std::io::stdout().flush()?;
        config.docintel.endpoint = read_line();

        print!("Enter the analysis API key: ");
        std::io::stdout().flush()?;
        config.docintel.api_key = read_password();
    }
    println!();

    // ========================================================
    // Step 4: Agent naming
    // ========================================================
    println!("Step 4: Agent Naming");
    println!();

    print!("User prefix for agent names [{}]: ", config.user_prefix());
    std::io::stdout().flush()?;
    let prefix = read_line();
    if !prefix.is_empty() {
        config.user_prefix = prefix;
    }
    println!();

    // ========================================================
    // Step 5: Save configuration
    // ========================================================
    println!("Step 5: Saving Configuration");
    print!("Creating config... ");
    std::io::stdout().flush()?;

    config.save().await?;
    println!("✓ Saved to {}", finsight_config::config_path().display());
    println!();

    println!("Setup complete! ✓");
    println!();
    println!("Next steps:");
    println!("  - Chat about a filing: finsight chat TSLA--10-K--2024-10-01_120000.pdf");
    println!("  - List stores:         finsight stores");
    println!("  - Check status:        finsight status");

    Ok(())
}

/// Initialize config
pub async fn init_command() -> Result<()> {
    println!("◆ Initializing Finsight...");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let config = finsight_config::init().await?;

    println!(
        "\n◆ Config at {}",
        finsight_config::config_path().display()
    );
    println!("\nNext steps:");
    println!("  1. Add your API key: finsight setup");
    println!("     (or set FINSIGHT_API_KEY)");
    println!("  2. Start the capability server at {}", config.capability_url());
    println!("  3. Chat: finsight chat TSLA--10-K--2024-10-01_120000.pdf");

    Ok(())
}

/// Show effective configuration
pub async fn status_command() -> Result<()> {
    let config_path = finsight_config::config_path();

    println!("◆ Finsight Status");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    println!(
        "Config:      {} {}",
        config_path.display(),
        if config_path.exists() {
            "[OK]"
        } else {
            "[Missing]"
        }
    );

    let config = Config::load().await?;
    println!("Model:       {}", config.model());
    println!(
        "API Key:     {}",
        if config.has_api_key() {
            "[Set]"
        } else {
            "[Missing]"
        }
    );
    println!("Capability:  {}", config.capability_url());
    println!(
        "Doc intel:   {}",
        if config.docintel_endpoint().is_some() {
            "[Configured]"
        } else {
            "[Not configured]"
        }
    );
    println!("User prefix: {}", config.user_prefix());
    println!(
        "Polling:     every {} ms, up to {} polls",
        config.run.poll_interval_ms, config.run.max_polls
    );

    println!("\n◆ Ready");

    Ok(())
}
