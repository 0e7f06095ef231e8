//! Switchyard CLI - cost- and quota-aware LLM provider router

use clap::{Parser, Subcommand};
use switchyard_core::config::Config;
use switchyard_core::providers::{Message, estimate_tokens};
use switchyard_core::quota::QuotaTracker;
use switchyard_core::registry::{
    ProviderId, ProviderRegistry, RateLimits, TaskSupport, TaskType,
};
use switchyard_core::routing::{CompletionResult, RequestContext, Router};
use switchyard_core::usage::UsageAccountant;
use tracing::warn;

#[derive(Parser)]
#[command(name = "switchyard")]
#[command(author, version, about = "Cost- and quota-aware router for LLM providers", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text")]
    format: OutputFormat,

    /// Quiet mode (minimal output)
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Clone, Copy, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Route a completion request to the best provider
    Route {
        /// The prompt to send
        prompt: String,
        /// Task type (reasoning, chat, simple, development)
        #[arg(short, long)]
        task: Option<String>,
        /// Estimated token consumption (default: estimated from the prompt)
        #[arg(long)]
        tokens: Option<u32>,
        /// Route as production traffic
        #[arg(short, long)]
        production: bool,
        /// Prioritize latency over cost
        #[arg(short, long)]
        speed: bool,
        /// Pin a specific provider (still subject to filters and quota)
        #[arg(long)]
        provider: Option<String>,
        /// Optional system message
        #[arg(long)]
        system: Option<String>,
        /// Route the same request this many times
        #[arg(short, long, default_value_t = 1)]
        count: u32,
        /// Show the routing plan without dispatching
        #[arg(long)]
        explain: bool,
    },

    /// Inspect the provider fleet
    Providers {
        #[command(subcommand)]
        action: ProviderAction,
    },

    /// Show per-provider quota state
    Quota,

    /// Show usage and budget for this run
    Usage,

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Run health check
    Doctor,
}

#[derive(Subcommand)]
enum ProviderAction {
    /// List all providers
    List,
    /// Show provider details
    Show { id: String },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Get a configuration value
    Get { key: String },
    /// Set a configuration value
    Set { key: String, value: String },
    /// List all configuration values
    List,
    /// Reset configuration to defaults
    Reset,
    /// Show config file path
    Path,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let default_directive = if cli.quiet {
        "switchyard=error"
    } else {
        "switchyard=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(default_directive.parse()?),
        )
        .init();

    match cli.command {
        Commands::Route {
            prompt,
            task,
            tokens,
            production,
            speed,
            provider,
            system,
            count,
            explain,
        } => {
            let config = Config::load()?;
            cmd_route(
                &config,
                RouteArgs {
                    prompt,
                    task,
                    tokens,
                    production,
                    speed,
                    provider,
                    system,
                    count,
                    explain,
                },
                cli.format,
                cli.quiet,
            )
            .await
        }

        Commands::Providers { action } => cmd_providers(action, cli.format, cli.quiet),

        Commands::Quota => cmd_quota(cli.format, cli.quiet),

        Commands::Usage => {
            let config = Config::load()?;
            cmd_usage(&config, cli.format, cli.quiet)
        }

        Commands::Config { action } => cmd_config(action, cli.quiet),

        Commands::Doctor => cmd_doctor(cli.quiet),
    }
}

// ============================================================================
// Command Implementations
// ============================================================================

struct RouteArgs {
    prompt: String,
    task: Option<String>,
    tokens: Option<u32>,
    production: bool,
    speed: bool,
    provider: Option<String>,
    system: Option<String>,
    count: u32,
    explain: bool,
}

async fn cmd_route(
    config: &Config,
    args: RouteArgs,
    format: OutputFormat,
    quiet: bool,
) -> anyhow::Result<()> {
    let task_type = match args.task.as_deref() {
        Some(t) => t.parse::<TaskType>().map_err(|e| anyhow::anyhow!("{}", e))?,
        None => config.routing.default_task_type()?,
    };

    let mut messages = Vec::new();
    if let Some(system) = &args.system {
        messages.push(Message::system(system));
    }
    messages.push(Message::user(&args.prompt));

    let estimated = args
        .tokens
        .unwrap_or_else(|| estimate_tokens(&messages).max(1));

    let mut ctx = RequestContext::new(task_type)
        .with_estimated_tokens(estimated)
        .with_production(args.production)
        .with_speed(args.speed || config.routing.prefer_speed);
    if let Some(p) = &args.provider {
        let id = p.parse::<ProviderId>().map_err(|e| anyhow::anyhow!("{}", e))?;
        ctx = ctx.with_provider_override(id);
    }

    let router = Router::from_config(config);

    if args.explain {
        let plan = router.plan(&ctx)?;
        match format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&plan)?),
            OutputFormat::Text => {
                if plan.is_empty() {
                    println!("No provider can serve this request ({}).", plan.reason);
                } else {
                    println!("Plan: {}", plan.reason);
                    for (i, id) in plan.candidates.iter().enumerate() {
                        let profile = router.registry().get(*id)?;
                        println!(
                            "  {}. {} (${:.2}/1M tokens, {:.1}s avg latency)",
                            i + 1,
                            id,
                            profile.cost_per_million_tokens,
                            profile.avg_latency_secs
                        );
                    }
                }
            }
        }
        return Ok(());
    }

    for _ in 0..args.count {
        let result = router.route_and_complete(&messages, &ctx).await?;
        match format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
            OutputFormat::Text => print_result(&result, quiet),
        }
    }

    if args.count > 1 && !quiet && matches!(format, OutputFormat::Text) {
        let ledger = router.usage().snapshot();
        println!();
        println!(
            "Run total: {} request(s), ${:.4}",
            ledger.total_calls, ledger.total_cost_usd
        );
    }

    Ok(())
}

fn print_result(result: &CompletionResult, quiet: bool) {
    if result.success {
        let provider = result
            .provider
            .map(|p| p.to_string())
            .unwrap_or_else(|| "unknown".to_string());
        if quiet {
            println!("{}", provider);
        } else {
            println!("Routed to {} ({})", provider, result.selection_reason);
            println!("  Attempts: {}", result.attempts);
            println!("  Latency: {:.2}s", result.latency_secs);
            println!("  Tokens: {}", result.tokens_used);
            println!("  Cost: ${:.6}", result.cost_usd);
            if let Some(content) = &result.content {
                println!();
                println!("{}", content);
            }
        }
    } else {
        println!(
            "No provider could serve this request ({}).",
            result.selection_reason
        );
        if let Some(detail) = &result.error_detail {
            println!("  Detail: {}", detail);
        }
    }
}

fn cmd_providers(action: ProviderAction, format: OutputFormat, quiet: bool) -> anyhow::Result<()> {
    let registry = ProviderRegistry::with_defaults();

    match action {
        ProviderAction::List => match format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(registry.get_all())?)
            }
            OutputFormat::Text => {
                if !quiet {
                    println!("Providers ({}):", registry.len());
                }
                for p in registry.get_all() {
                    println!(
                        "  {} - ${:.2}/1M tokens, {:.1}s avg latency, production: {}",
                        p.id,
                        p.cost_per_million_tokens,
                        p.avg_latency_secs,
                        if p.production_eligible { "yes" } else { "no" }
                    );
                    println!("      tasks: {}", format_tasks(&p.supported_tasks));
                    println!("      limits: {}", format_limits(&p.limits));
                }
            }
        },
        ProviderAction::Show { id } => {
            let id = id
                .parse::<ProviderId>()
                .map_err(|e| anyhow::anyhow!("{}", e))?;
            let p = registry.get(id)?;
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(p)?),
                OutputFormat::Text => {
                    println!("Provider: {}", p.id);
                    println!("  Cost: ${:.2}/1M tokens", p.cost_per_million_tokens);
                    println!("  Avg latency: {:.1}s", p.avg_latency_secs);
                    println!("  Tasks: {}", format_tasks(&p.supported_tasks));
                    println!("  Limits: {}", format_limits(&p.limits));
                    println!(
                        "  Production eligible: {}",
                        if p.production_eligible { "yes" } else { "no" }
                    );
                }
            }
        }
    }
    Ok(())
}

fn cmd_quota(format: OutputFormat, quiet: bool) -> anyhow::Result<()> {
    let registry = ProviderRegistry::with_defaults();
    let quota = QuotaTracker::new(&registry);
    let snapshot = quota.snapshot();

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&snapshot)?),
        OutputFormat::Text => {
            if !quiet {
                println!("Quota State (this run):");
            }
            for (id, state) in &snapshot {
                let limits = quota.limits_for(*id).unwrap_or_default();
                println!("  {}:", id);
                println!(
                    "    requests this minute: {} / {}",
                    state.requests_used_this_minute,
                    limit_str(limits.requests_per_minute)
                );
                println!(
                    "    requests today: {} / {}",
                    state.requests_used_today,
                    limit_str(limits.requests_per_day)
                );
                println!(
                    "    tokens today: {} / {}",
                    state.tokens_used_today,
                    limit_str(limits.tokens_per_day)
                );
                println!(
                    "    minute window resets: {}",
                    state.minute_reset_at.format("%Y-%m-%d %H:%M:%S")
                );
                println!(
                    "    day window resets: {}",
                    state.day_reset_at.format("%Y-%m-%d %H:%M:%S")
                );
            }
        }
    }
    Ok(())
}

fn cmd_usage(config: &Config, format: OutputFormat, quiet: bool) -> anyhow::Result<()> {
    let accountant = UsageAccountant::from_config(&config.usage);
    let ledger = accountant.snapshot();

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&ledger)?),
        OutputFormat::Text => {
            if !quiet {
                println!("Usage Summary (this run):");
                println!();
                println!("  Calls: {}", ledger.total_calls);
                println!("  Spend: ${:.4}", ledger.total_cost_usd);

                if !ledger.per_provider.is_empty() {
                    println!("  By provider:");
                    let mut rows: Vec<_> = ledger.per_provider.iter().collect();
                    rows.sort_by_key(|(id, _)| **id);
                    for (id, usage) in rows {
                        println!(
                            "    {}: ${:.4} ({} calls, {} tokens)",
                            id, usage.cost_usd, usage.calls, usage.tokens
                        );
                    }
                }

                println!();
                println!("  Daily limit: ${:.2}", accountant.daily_limit());
                println!("  Remaining: ${:.2}", accountant.remaining_budget());
                println!(
                    "  Alert threshold: {:.0}%",
                    config.usage.alert_threshold * 100.0
                );

                if accountant.is_over_limit() {
                    println!();
                    println!("  [WARNING] Budget limit exceeded!");
                } else if accountant.is_approaching_limit() {
                    println!();
                    println!("  [WARNING] Approaching budget limit");
                }
            }
        }
    }
    Ok(())
}

fn cmd_config(action: ConfigAction, quiet: bool) -> anyhow::Result<()> {
    match action {
        ConfigAction::Get { key } => {
            let config = Config::load()?;
            let value = config.get(&key)?;
            println!("{}", value);
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load()?;
            config.set(&key, &value)?;
            config.save()?;
            if !quiet {
                println!("Set {} = {}", key, value);
            }
        }
        ConfigAction::List => {
            let config = Config::load()?;
            let items = config.list()?;
            for (key, value) in items {
                println!("{} = {}", key, value);
            }
        }
        ConfigAction::Reset => {
            Config::reset()?;
            if !quiet {
                println!("Configuration reset to defaults.");
            }
        }
        ConfigAction::Path => {
            let path = Config::config_path()?;
            println!("{}", path.display());
        }
    }
    Ok(())
}

fn cmd_doctor(quiet: bool) -> anyhow::Result<()> {
    if !quiet {
        println!("Switchyard Health Check");
        println!("=======================");
        println!();
    }

    let mut all_ok = true;

    // Check configuration
    let config = match Config::load() {
        Ok(config) => {
            if !quiet {
                println!("[OK] Configuration: Valid");
            }
            config
        }
        Err(e) => {
            all_ok = false;
            if !quiet {
                warn!("Configuration invalid: {}", e);
                println!("[!!] Configuration: Error - {}", e);
            }
            Config::default()
        }
    };

    // Check config file location
    if !quiet {
        match Config::config_path() {
            Ok(path) => {
                if path.exists() {
                    println!("[OK] Config file: {}", path.display());
                } else {
                    println!("[--] Config file: {} (using defaults)", path.display());
                }
            }
            Err(e) => {
                println!("[!!] Config file: Error - {}", e);
            }
        }
    }

    // Check the provider fleet
    let registry = ProviderRegistry::with_defaults();
    if registry.is_empty() {
        all_ok = false;
        if !quiet {
            println!("[!!] Registry: No providers");
        }
    } else {
        if !quiet {
            println!("[OK] Registry: {} providers", registry.len());
        }
        for p in registry.get_all() {
            if p.cost_per_million_tokens < 0.0 || p.avg_latency_secs <= 0.0 {
                all_ok = false;
                if !quiet {
                    println!("[!!] Profile {}: implausible cost or latency", p.id);
                }
            }
        }
    }

    // Dry-run plan for a default request
    let router = Router::from_config(&config);
    let task = config.routing.default_task_type().unwrap_or(TaskType::Chat);
    match router.plan(&RequestContext::new(task)) {
        Ok(plan) if !plan.is_empty() => {
            if !quiet {
                println!(
                    "[OK] Routing: {} candidate(s) for a default {} request",
                    plan.candidates.len(),
                    task
                );
            }
        }
        Ok(_) => {
            all_ok = false;
            if !quiet {
                warn!("No candidate for a default {} request", task);
                println!("[!!] Routing: no candidate for a default {} request", task);
            }
        }
        Err(e) => {
            all_ok = false;
            if !quiet {
                println!("[!!] Routing: Error - {}", e);
            }
        }
    }

    // Summary
    if !quiet {
        println!();
        if all_ok {
            println!("All checks passed!");
        } else {
            println!("Some checks failed. See above for details.");
        }
    }

    Ok(())
}

// ============================================================================
// Display Helpers
// ============================================================================

fn format_tasks(tasks: &TaskSupport) -> String {
    match tasks {
        TaskSupport::Any => "any".to_string(),
        TaskSupport::Listed(list) => list
            .iter()
            .map(|t| t.to_string())
            .collect::<Vec<_>>()
            .join(", "),
    }
}

fn format_limits(limits: &RateLimits) -> String {
    if limits.is_unlimited() {
        return "unlimited".to_string();
    }
    let mut parts = Vec::new();
    if let Some(rpm) = limits.requests_per_minute {
        parts.push(format!("{}/min", rpm));
    }
    if let Some(rpd) = limits.requests_per_day {
        parts.push(format!("{}/day", rpd));
    }
    if let Some(tpd) = limits.tokens_per_day {
        parts.push(format!("{} tokens/day", tpd));
    }
    parts.join(", ")
}

fn limit_str<T: std::fmt::Display>(limit: Option<T>) -> String {
    limit
        .map(|l| l.to_string())
        .unwrap_or_else(|| "unlimited".to_string())
}
