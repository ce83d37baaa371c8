//! Scene hierarchy walkthrough.
//!
//! Run with `RUST_LOG=arbor_container=debug` to watch the container log.

use std::sync::Arc;

use arbor::prelude::*;
use tracing_subscriber::EnvFilter;

// === Services ===

trait Music: Send + Sync {
    fn track(&self) -> &'static str;
}

struct Calm;
impl Music for Calm {
    fn track(&self) -> &'static str {
        "town theme"
    }
}

struct Battle;
impl Music for Battle {
    fn track(&self) -> &'static str {
        "dungeon theme"
    }
}

struct SaveSystem;

struct LootTable {
    floor: u32,
}

#[derive(Clone)]
struct Encounter {
    id: u32,
}

// === Providers ===

struct CoreProvider;

impl Provider for CoreProvider {
    fn register(&self, services: ContainerBuilder) -> ContainerBuilder {
        services
            .singleton_with::<Arc<SaveSystem>>(|_| Ok(Arc::new(SaveSystem)))
            .singleton_with::<Arc<dyn Music>>(|_| Ok(Arc::new(Calm) as Arc<dyn Music>))
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let scenes = ContainerRegistry::new();
    let mut events = scenes.diagnostics().subscribe();

    let global = scenes.initialize_root(Container::builder().add_provider(&CoreProvider))?;

    let dungeon = scenes.create_named(
        "Dungeon",
        Container::builder()
            .singleton_with::<Arc<dyn Music>>(|_| Ok(Arc::new(Battle) as Arc<dyn Music>))
            .scoped_with::<Encounter>(|_| Ok(Encounter { id: 1 })),
        None,
    )?;
    let floor1 = scenes.create_named(
        "Floor1",
        Container::builder().transient_with::<LootTable>(|_| Ok(LootTable { floor: 1 })),
        Some("Dungeon"),
    )?;
    scenes.create_named("MainMenu", Container::builder(), None)?;

    println!("{}", global.render_tree());
    println!("Path: {}", floor1.hierarchy_path());

    let music: Arc<dyn Music> = floor1.resolve_required()?;
    println!("Floor1 plays the {}", music.track());
    let music: Arc<dyn Music> = global.resolve_required()?;
    println!("Global plays the {}", music.track());

    let loot: LootTable = floor1.resolve_required()?;
    println!("Loot table for floor {}", loot.floor);

    {
        let scope = dungeon.create_scope()?;
        let encounter: Encounter = scope.resolve_required()?;
        println!("{} runs encounter #{}", scope.name(), encounter.id);
    }

    let support = floor1.supports::<Arc<SaveSystem>>()?;
    println!("Floor1 can reach the save system: {} (exact: {})", support.supported, support.exact);

    scenes.unload("Dungeon")?;
    println!("After unloading Dungeon: {:?}", scenes.list_names());
    println!("{}", global.render_tree());

    scenes.shutdown();

    for event in events.drain() {
        println!("  [{}] {}", event.kind(), event.container_name());
    }

    Ok(())
}
