use application_ai::config::{self, AppConfig, Overrides};
use application_ai::generator::{Generator, Outcome};
use application_ai::{llm, render as render_mod};
use anyhow::bail;
use clap::error::ErrorKind;
use clap::Parser;
use std::io::Write;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "application-ai",
    version,
    about = "Application AI is an application generator that uses OpenAI",
    long_about = None
)]
struct Cli {
    /// What to build, e.g. "Create a static html page with a contact form"
    #[arg(value_name = "PROMPT", required_unless_present = "list_deployments")]
    prompt: Option<String>,

    /// The API key for the OpenAI service. This is required.
    #[arg(short = 'k', long = "openai-api-key", env = "OPENAI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// The deployment name in OpenAI/Azure for the model
    #[arg(short = 'd', long = "openai-deployment-name", env = "OPENAI_DEPLOYMENT_NAME")]
    deployment: Option<String>,

    /// Overrides the model's context window when smaller than it
    #[arg(short = 'm', long = "max-tokens", env = "MAX_TOKENS")]
    max_tokens: Option<u32>,

    /// Azure OpenAI endpoint; when set Azure is used instead of OpenAI
    #[arg(short = 'e', long = "azure-openai-endpoint", env = "AZURE_OPENAI_ENDPOINT")]
    azure_endpoint: Option<String>,

    /// Create the files without asking for confirmation
    #[arg(
        short = 's',
        long = "skip-confirmation",
        env = "SKIP_CONFIRMATION",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true",
        value_parser = clap::builder::FalseyValueParser::new()
    )]
    skip_confirmation: Option<bool>,

    /// Sampling temperature; closer to 0 is more deterministic
    #[arg(short = 't', long = "temperature", env = "TEMPERATURE")]
    temperature: Option<f32>,

    /// Extra context telling the model what kind of app to generate
    #[arg(short = 'c', long = "openai-chat-context", env = "OPENAI_CHAT_CONTEXT")]
    chat_context: Option<String>,

    /// Base URL of the OpenAI API
    #[arg(long = "openai-api-base", env = "OPENAI_API_BASE")]
    api_base: Option<String>,

    /// Timeout (seconds) for network requests
    #[arg(long = "timeout")]
    timeout_secs: Option<u64>,

    /// Print the known deployments and exit
    #[arg(long = "list-deployments")]
    list_deployments: bool,

    /// Output JSON instead of human-readable text
    #[arg(long = "json")]
    json: bool,

    /// Increase verbosity (-v, -vv)
    #[arg(short = 'v', action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();
}

/// Usage errors exit 1 like every other failure; help and version still exit 0.
fn parse_cli() -> Cli {
    match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => e.exit(),
        Err(e) => {
            if std::env::args().any(|a| a == "--json") {
                let rendered = e.to_string();
                let message = rendered.lines().next().unwrap_or_default().trim_start_matches("error: ");
                render_mod::print_json_error("invalid_args", message, Some("run with --help"));
            } else {
                let _ = e.print();
            }
            std::process::exit(1);
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = parse_cli();
    init_logging(cli.verbose);

    let json = cli.json;
    if let Err(e) = run(cli).await {
        let msg = format!("{:#}", e);
        if json {
            let (code, hint) = classify_error(&msg);
            render_mod::print_json_error(code, &msg, hint);
        } else {
            eprintln!("{}", msg);
        }
        std::process::exit(1);
    }
    Ok(())
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    if cli.list_deployments {
        render_mod::render_deployments(cli.json);
        return Ok(());
    }

    let file_cfg = config::load_config_if_exists(&config::default_config_path()?)?;
    let overrides = Overrides {
        api_key: cli.api_key,
        deployment: cli.deployment,
        max_tokens: cli.max_tokens,
        azure_endpoint: cli.azure_endpoint,
        skip_confirmation: cli.skip_confirmation,
        temperature: cli.temperature,
        chat_context: cli.chat_context,
        api_base: cli.api_base,
        timeout_secs: cli.timeout_secs,
    };
    let cfg = AppConfig::resolve(overrides, file_cfg)?;

    let client = llm::new_ai_client(&cfg)?;
    let mut generator = Generator::new(client, cfg.skip_confirmation, std::env::current_dir()?);
    let prompt = cli.prompt.unwrap_or_default();
    let json = cli.json;

    // Reading stdin blocks its thread, so the loop gets its own task and the signal is awaited here.
    let task = tokio::spawn(async move {
        let mut input = std::io::BufReader::new(std::io::stdin());
        let mut out: Box<dyn Write + Send> =
            if json { Box::new(std::io::stderr()) } else { Box::new(std::io::stdout()) };
        generator.run(&prompt, &mut input, &mut out).await
    });
    let outcome = tokio::select! {
        res = task => res??,
        _ = tokio::signal::ctrl_c() => bail!("interrupted"),
    };

    match outcome {
        Outcome::Applied(written) => render_mod::render_outcome(json, Some(written.as_slice())),
        Outcome::Discarded => render_mod::render_outcome(json, None),
    }
    Ok(())
}

fn classify_error(message: &str) -> (&'static str, Option<&'static str>) {
    let msg = message.to_lowercase();
    if msg.contains("missing openai_api_key") {
        return ("missing_api_key", Some("set OPENAI_API_KEY in env or .env"));
    }
    if msg.contains("unknown deployment") || msg.contains("invalid azure deployment name") {
        return ("invalid_deployment", Some("run with --list-deployments"));
    }
    if msg.contains("invalid temperature") || msg.contains("config toml") || msg.contains("config file") {
        return ("invalid_config", None);
    }
    if msg.contains("prompt too large") {
        return ("budget_exceeded", Some("shorten the prompt or pick a deployment with a larger window"));
    }
    if msg.contains("couldn't parse openai response") || msg.contains("expected choices") {
        return ("parse_error", Some("try again or refine the prompt"));
    }
    if msg.contains("openai error") {
        return ("provider_error", None);
    }
    if msg.contains("timed out") || msg.contains("timeout") {
        return ("timeout", Some("try increasing --timeout or check network"));
    }
    if msg.contains("error sending request") || msg.contains("dns") || msg.contains("connection refused") {
        return ("network_error", None);
    }
    if msg.contains("writing file") || msg.contains("creating directory") {
        return ("io_error", None);
    }
    if msg.contains("interrupted") {
        return ("interrupted", None);
    }
    ("unknown", None)
}
