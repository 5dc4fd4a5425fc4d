use ability_pipeline::{
    cli::{
        commands::{PlanCommand, RunCommand, ValidateCommand},
        output::*,
        Cli, Command,
    },
    core::pipeline::load_definition,
    execution::{outline, ExecutionEngine},
    ExecutionLimits, FixtureAbilities, Pipeline, PipelineValidator, TransformRegistry,
};
use anyhow::{bail, Context, Result};
use serde_json::{Map, Value};
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::from_args();

    // Initialize logging; stdout is reserved for results
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to set logging subscriber: {}", e))?;

    // Execute command
    let succeeded = match &cli.command {
        Command::Run(cmd) => run_pipeline(cmd).await?,
        Command::Validate(cmd) => validate_pipeline(cmd)?,
        Command::Plan(cmd) => plan_pipeline(cmd)?,
    };

    if !succeeded {
        std::process::exit(1);
    }
    Ok(())
}

fn validator() -> PipelineValidator {
    PipelineValidator::new().with_known_transforms(TransformRegistry::new().names())
}

fn load_context(cmd: &RunCommand) -> Result<Map<String, Value>> {
    let mut context = match &cmd.context {
        Some(path) => match load_definition(path)? {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            _ => bail!("Context file {} must contain an object", path),
        },
        None => Map::new(),
    };

    for (key, value) in &cmd.variables {
        debug!("Variable override: {} = {}", key, value);
        context.insert(key.clone(), value.clone());
    }
    Ok(context)
}

async fn run_pipeline(cmd: &RunCommand) -> Result<bool> {
    let definition = load_definition(&cmd.file).context("Failed to load pipeline")?;

    let file_limits = definition
        .get("limits")
        .cloned()
        .map(serde_json::from_value::<ExecutionLimits>)
        .transpose()
        .context("Invalid 'limits' block in pipeline file")?;
    let limits = cmd.limits(file_limits);

    let context = load_context(cmd)?;
    let abilities = match &cmd.abilities {
        Some(path) => FixtureAbilities::from_file(path)?,
        None => FixtureAbilities::new(),
    };

    let engine = ExecutionEngine::new(abilities);

    let spinner = if cmd.json { None } else { Some(create_spinner()) };
    if let Some(spinner) = &spinner {
        let spinner = spinner.clone();
        engine.add_event_handler(move |event| {
            if let Some(message) = format_step_started(&event) {
                spinner.set_message(message);
            } else if let Some(line) = format_execution_event(&event) {
                spinner.println(line);
            }
        });
    }

    let result = engine
        .execute(&definition, Value::Object(context), &limits)
        .await;

    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(result.success);
    }

    println!();
    if result.success {
        println!("{} Pipeline completed {}", CHECK, style("successfully").green());
        println!("  Result:\n{}", format_value(&result.result, 20));
    } else {
        if let Some(err) = &result.error {
            error!("{}", err.message);
            println!("{}", format_error(err));
        }
        if result.never_ran() {
            println!("{} No steps were executed", INFO);
        }
    }
    println!("  Stats: {}", format_stats(&result.stats));

    Ok(result.success)
}

fn validate_pipeline(cmd: &ValidateCommand) -> Result<bool> {
    let definition = load_definition(&cmd.file).context("Failed to load pipeline")?;

    let mut validator = validator();
    validator.validate(&definition);
    let report = validator.report();

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(report.valid);
    }

    println!("{} Validating pipeline {}...", INFO, style(&cmd.file).bold());
    for warning in &report.warnings {
        println!("  {} {}", WARN, style(warning).yellow());
    }

    if report.valid {
        println!("{} Pipeline definition is valid!", CHECK);
        if let Ok(pipeline) = Pipeline::from_value(&definition) {
            println!("  Steps: {}", style(pipeline.total_steps()).cyan());
            println!("  Max nesting: {}", style(pipeline.max_nesting()).cyan());
        }
    } else {
        println!("{} Validation failed with {} error(s):", CROSS, report.errors.len());
        for err in &report.errors {
            println!("  {}", style(err).red());
        }
    }

    Ok(report.valid)
}

fn plan_pipeline(cmd: &PlanCommand) -> Result<bool> {
    let definition = load_definition(&cmd.file).context("Failed to load pipeline")?;

    let mut validator = validator();
    if !validator.validate(&definition) {
        println!("{} Cannot plan an invalid pipeline:", CROSS);
        for err in validator.errors() {
            println!("  {}", style(err).red());
        }
        return Ok(false);
    }

    let pipeline = Pipeline::from_value(&definition)?;
    let plan = outline(&pipeline);

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
        return Ok(true);
    }

    println!(
        "{} Plan for {} ({} steps, nesting {})",
        INFO,
        style(plan.name.as_deref().unwrap_or(&cmd.file)).bold(),
        plan.total_steps,
        plan.max_nesting
    );
    for entry in &plan.entries {
        println!("{}", format_plan_entry(entry));
    }
    Ok(true)
}
