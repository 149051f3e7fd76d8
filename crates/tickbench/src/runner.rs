//! The `run`, `plan` and `list` commands.

use tickbench_engine::{
    Command, EngineConfig, Fanout, IndicatorFeedback, Orchestrator, Registry, TracingFeedback,
};
use tickbench_world::{MemoryFixtureStore, WorldHandle};
use tracing::info;

use crate::{
    cli::{RunArgs, SuiteArgs},
    error::{Error, Result},
    suite::{self, Suite},
};

/// Everything a command needs, loaded from the CLI options.
struct Session {
    /// Effective configuration.
    config: EngineConfig,
    /// Discovered tests.
    registry: Registry,
    /// Built-in fixtures plus any loaded from disk.
    store: MemoryFixtureStore,
}

/// Load configuration, fixtures and the suite registry.
fn load(args: &SuiteArgs) -> Result<Session> {
    let mut config = EngineConfig::load_or_default(&args.config)?;
    if let Some(namespace) = &args.namespace {
        config.namespace.clone_from(namespace);
    }
    let mut store = suite::builtin_fixtures()?;
    if let Some(dir) = &args.fixtures {
        store.extend_from_dir(dir)?;
    }
    let registry = Registry::from_source(&Suite::new(config.namespace.clone(), config.defaults))?;
    info!(
        tests = registry.len(),
        fixtures = store.len(),
        namespace = %config.namespace,
        "suite loaded"
    );
    Ok(Session {
        config,
        registry,
        store,
    })
}

/// Run the whole suite headlessly. Returns the process exit status: the
/// number of failed tests, saturating at 255.
pub fn run(args: &RunArgs) -> Result<i32> {
    let Session {
        config,
        registry,
        store,
    } = load(&args.suite)?;
    let max_ticks = args.max_ticks.unwrap_or(config.max_ticks);
    let world = WorldHandle::grid();
    let mut orchestrator = Orchestrator::new(registry, store, world.clone())
        .with_config(&config)
        .with_feedback(
            Fanout::new()
                .with(TracingFeedback)
                .with(IndicatorFeedback::new(world)),
        );

    for command in [Command::Setup, Command::Run] {
        let reply = command.execute(&mut orchestrator);
        for line in &reply.lines {
            println!("{line}");
        }
        if !reply.success {
            return Err(Error::Command {
                command: command.to_string(),
                message: reply.to_string(),
            });
        }
    }

    let Some(summary) = orchestrator.run_until_complete(max_ticks) else {
        return Err(Error::TickLimit {
            ticks: orchestrator.current_tick(),
            active: orchestrator.active_count(),
        });
    };

    for outcome in orchestrator
        .outcomes()
        .iter()
        .filter(|o| !o.result.is_success())
    {
        println!("Test Failed {}", outcome.name);
        for error in outcome.result.errors() {
            println!("  {error}");
        }
    }
    println!("{summary}");
    println!("{}", summary.failed_line());
    Ok(i32::try_from(summary.failed.min(255)).unwrap_or(255))
}

/// Print the slot each test would be placed in.
pub fn plan(args: &SuiteArgs) -> Result<()> {
    let Session {
        config,
        registry,
        store,
    } = load(args)?;
    let orchestrator = Orchestrator::new(registry, store, WorldHandle::grid()).with_config(&config);
    for placement in orchestrator.plan()? {
        println!(
            "{:<28} {:<36} origin {} footprint {}",
            placement.definition.name().as_str(),
            placement.definition.fixture().to_string(),
            placement.slot.origin,
            placement.slot.footprint()
        );
    }
    Ok(())
}

/// Print the registry grouped and in layout order.
pub fn list(args: &SuiteArgs) -> Result<()> {
    let Session { registry, .. } = load(args)?;
    let descriptions: Vec<_> = Suite::descriptions().collect();
    for group in registry.groups() {
        println!("{}", group.key());
        for def in group.tests() {
            let name = def.name().as_str();
            let info = descriptions
                .iter()
                .find(|(key, _)| {
                    name == key.as_str()
                        || name
                            .strip_prefix(key.as_str())
                            .is_some_and(|rest| rest.starts_with('/'))
                })
                .map_or("", |(_, info)| *info);
            println!(
                "  {name:<26} {:<36} refresh {:<3} {:<10} {info}",
                def.fixture().to_string(),
                def.refresh_ticks(),
                def.timeout().to_string()
            );
        }
    }
    Ok(())
}
