use std::path::PathBuf;

use schema_options_core::{
    App, AppConfig, ArgumentState, CliOption, LogLevel, OptionError, OptionSet, ValueType,
    load_schema, schema_to_options,
};
use serde_json::Value;
use tracing::debug;

const APP_NAME: &str = "schema-opts";
const APP_DESCRIPTION: &str =
    "Compile JSON schemas into command-line options and resolve metadata instances.";
const CONFIG_ENV: &str = "SCHEMA_OPTS_CONFIG";

#[derive(Debug, Clone, Copy)]
enum Command {
    Describe,
    Resolve,
    List,
}

/// Per-invocation state: the arguments and the help text for the current scope.
struct Session {
    config: AppConfig,
    state: ArgumentState,
    help: String,
}

fn app() -> App<Command> {
    App::new(APP_NAME, APP_DESCRIPTION)
        .with_subcommand(
            "describe",
            "Print the options a schema compiles to.",
            Command::Describe,
        )
        .with_subcommand(
            "resolve",
            "Resolve arguments against a schema and print the resulting instance.",
            Command::Resolve,
        )
        .with_subcommand("list", "List the schemas named in the configuration.", Command::List)
}

fn main() {
    let app = app();

    let config = match load_config() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(1);
        }
    };

    let state = match ArgumentState::from_args(std::env::args().skip(1)) {
        Ok(state) => state,
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.exit_code());
        }
    };

    init_tracing(state.log_level().unwrap_or(config.log_level));

    let mut session = Session {
        config,
        state,
        help: app.render_help(),
    };

    if let Err(err) = run(&app, &mut session) {
        report(&err, &session.help);
        std::process::exit(err.exit_code());
    }
}

fn load_config() -> Result<AppConfig, OptionError> {
    match std::env::var_os(CONFIG_ENV) {
        Some(path) => AppConfig::load(PathBuf::from(path)),
        None => Ok(AppConfig::default()),
    }
}

fn init_tracing(level: LogLevel) {
    tracing_subscriber::fmt()
        .with_env_filter(format!("schema_options_core={level},schema_opts={level}"))
        .with_writer(std::io::stderr)
        .init();
}

fn report(err: &OptionError, help: &str) {
    if matches!(err, OptionError::HelpRequested) {
        print!("{help}");
        return;
    }
    eprintln!("error: {err}");
    if err.shows_help() {
        eprintln!();
        eprint!("{help}");
    }
}

fn run(app: &App<Command>, session: &mut Session) -> Result<(), OptionError> {
    let subcommand = app.require_subcommand(&mut session.state)?;
    session.help = format!("{}\n", subcommand.description);

    match subcommand.handler {
        Command::Describe => run_describe(session),
        Command::Resolve => run_resolve(session),
        Command::List => run_list(session),
    }
}

fn schema_options(config: &AppConfig) -> OptionSet {
    let mut schema_name = CliOption::new("--schema_name", ValueType::String)
        .with_description("Name of a schema registered in the configuration.");
    if !config.schemas.is_empty() {
        schema_name = schema_name.with_one_of(
            config
                .schemas
                .keys()
                .map(|name| Value::String(name.clone()))
                .collect(),
        );
    }

    [
        CliOption::new("--schema", ValueType::String)
            .with_description("Path of the JSON schema file."),
        schema_name,
    ]
    .into_iter()
    .collect()
}

/// Processes the schema-selection options and compiles the chosen schema.
fn compile_selected(
    session: &mut Session,
    builtins: &mut OptionSet,
) -> Result<OptionSet, OptionError> {
    session.help.push_str(&session.config.help.render_options(&*builtins));
    for option in builtins.iter_mut() {
        session.state.process_option(option, true)?;
    }

    let path = selected_schema(&session.config, builtins)?;
    let options = schema_to_options(&load_schema(&path)?)?;
    debug!(schema = %path.display(), options = options.len(), "compiled schema");

    session.help.push_str(&session.config.help.render_options(&options));
    Ok(options)
}

fn selected_schema(config: &AppConfig, builtins: &OptionSet) -> Result<PathBuf, OptionError> {
    let value_of = |key: &str| {
        builtins
            .get(key)
            .and_then(|option| option.value.as_str())
            .map(String::from)
    };

    if let Some(path) = value_of("schema") {
        return Ok(PathBuf::from(path));
    }
    if let Some(name) = value_of("schema_name") {
        return config
            .schema_path(&name)
            .map(PathBuf::from)
            .ok_or_else(|| OptionError::InvalidInput(format!("unknown schema '{name}'")));
    }
    Err(OptionError::MissingRequired {
        token: "--schema".to_string(),
        one_of: None,
    })
}

fn run_describe(session: &mut Session) -> Result<(), OptionError> {
    let mut builtins = schema_options(&session.config);
    let mut options = compile_selected(session, &mut builtins)?;

    // only the selection options are accepted here
    session.state.process_options(std::iter::empty::<&mut CliOption>())?;

    for option in options.iter_mut() {
        if option.required {
            option.description = Some(format!(
                "{} (required)",
                option.description.as_deref().unwrap_or("")
            ));
        }
    }
    print!("{}", session.config.help.render_options(&options));
    Ok(())
}

fn run_resolve(session: &mut Session) -> Result<(), OptionError> {
    let mut builtins = schema_options(&session.config);
    let mut options = compile_selected(session, &mut builtins)?;

    let mut instance_name = (!options.contains("name")).then(|| {
        CliOption::new("--name", ValueType::String)
            .with_description("Name of the instance; taken from the file name with --file.")
    });

    let mut extras: Vec<&mut CliOption> = instance_name.iter_mut().collect();
    extras.extend(options.iter_mut());
    session.state.process_options(extras)?;

    let mut instance = options.to_instance();
    if let (Some(name), Value::Object(map)) = (&instance_name, &mut instance) {
        if !name.value.is_null() {
            map.insert("name".to_string(), name.value.clone());
        }
    }

    let rendered = serde_json::to_string_pretty(&instance)
        .map_err(|err| OptionError::InvalidInput(format!("failed to serialize instance: {err}")))?;
    println!("{rendered}");
    Ok(())
}

fn run_list(session: &mut Session) -> Result<(), OptionError> {
    session.state.process_options(std::iter::empty::<&mut CliOption>())?;

    if session.config.schemas.is_empty() {
        println!("No schemas configured. Set {CONFIG_ENV} to a configuration file.");
        return Ok(());
    }
    for (name, path) in &session.config.schemas {
        println!("{name}\t{}", path.display());
    }
    Ok(())
}
