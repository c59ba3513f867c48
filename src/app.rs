use crate::analyzer::{AnalysisSession, MealAnalyzer};
use crate::auth::{Role, Session, UserDirectory};
use crate::buckets::ImageCategory;
use crate::capture::{CaptureOutcome, CaptureSurface, MockCaptureSurface};
use crate::catalog::FoodCatalog;
use crate::config::MealcamConfig;
use crate::error::{MealcamError, Result};
use crate::events::{EventBus, MealcamEvent};
use crate::ledger::{EntryId, MealCategory};
use crate::prefs::{PreferenceStore, Preferences};
use crate::tracking::TrackingStation;
use std::sync::Arc;
use std::time::SystemTime;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Outcome of one dispatched command.
enum Flow {
    Continue,
    Quit,
}

/// The interactive application: login, role dashboards, and the command
/// loop that stands in for screen navigation.
pub struct MealcamApp {
    catalog: FoodCatalog,
    directory: UserDirectory,
    station: TrackingStation,
    analysis: AnalysisSession,
    surface: Arc<MockCaptureSurface>,
    event_bus: Arc<EventBus>,
    pref_store: PreferenceStore,
    prefs: Preferences,
    session: Option<Session>,
    shutdown: CancellationToken,
}

impl MealcamApp {
    pub fn new(config: MealcamConfig) -> Self {
        let pref_store = PreferenceStore::new(&config.preferences.path);
        let prefs = pref_store.load();

        let event_bus = Arc::new(EventBus::new(config.system.event_bus_capacity));
        let surface = Arc::new(MockCaptureSurface::new(
            prefs.camera_facing,
            config.capture.artifact_dir.clone(),
        ));

        let station = TrackingStation::new(
            Arc::clone(&surface) as Arc<dyn CaptureSurface>,
            Arc::clone(&event_bus),
        );
        let analyzer = MealAnalyzer::new(config.analyzer.clone(), Arc::clone(&event_bus));
        let analysis = AnalysisSession::new(analyzer, Arc::clone(&event_bus));

        let catalog = if config.catalog.seed_sample {
            FoodCatalog::with_sample_data()
        } else {
            FoodCatalog::new()
        };

        Self {
            catalog,
            directory: UserDirectory::with_demo_accounts(),
            station,
            analysis,
            surface,
            event_bus,
            pref_store,
            prefs,
            session: None,
            shutdown: CancellationToken::new(),
        }
    }

    /// Token other tasks can use to request an orderly shutdown.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Run the command loop until quit, EOF, or Ctrl-C.
    pub async fn run(&mut self) -> Result<i32> {
        let mut events = self.event_bus.subscribe();
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let shutdown = self.shutdown.clone();

        self.print_banner();
        self.prompt();

        loop {
            tokio::select! {
                _ = signal::ctrl_c() => {
                    info!("Ctrl-C received, shutting down");
                    break;
                }
                _ = shutdown.cancelled() => {
                    info!("Shutdown requested");
                    break;
                }
                event = events.recv() => {
                    if let Ok(event) = event {
                        self.render_event(&event);
                    }
                }
                line = lines.next_line() => {
                    match line? {
                        Some(line) => {
                            match self.dispatch(line.trim()).await {
                                Ok(Flow::Quit) => break,
                                Ok(Flow::Continue) => {}
                                Err(e) => self.notice(&friendly_error(&e)),
                            }
                            self.prompt();
                        }
                        // stdin closed
                        None => break,
                    }
                }
            }
        }

        self.pref_store.save_best_effort(&self.prefs);
        info!("Mealcam session ended");
        Ok(0)
    }

    async fn dispatch(&mut self, line: &str) -> Result<Flow> {
        if line.is_empty() {
            return Ok(Flow::Continue);
        }
        let mut parts = line.split_whitespace();
        let command = parts.next().unwrap_or_default().to_lowercase();
        let args: Vec<&str> = parts.collect();

        debug!("Dispatching command: {}", command);
        match command.as_str() {
            "help" => self.cmd_help(),
            "quit" | "exit" => return Ok(Flow::Quit),
            "login" => self.cmd_login(&args),
            "logout" => self.cmd_logout(),
            "whoami" => self.cmd_whoami(),
            "theme" => self.cmd_theme(),
            "facing" => self.cmd_facing(),
            "menu" => self.cmd_menu(&args),
            // staff dashboard
            "track" => self.cmd_track(&args),
            "meals" => self.cmd_meals(&args),
            "open" => self.cmd_open(&args),
            "close" => self.cmd_close(),
            "shoot" => self.cmd_shoot(&args).await?,
            "measure" => self.cmd_measure(&args),
            "photos" => self.cmd_photos(&args),
            // admin dashboard
            "additem" => self.cmd_add_item(line),
            "edititem" => self.cmd_edit_item(line),
            "delitem" => self.cmd_del_item(&args),
            // nutritionist dashboard
            "facts" => self.cmd_facts(&args),
            // user dashboard
            "snap" => self.cmd_snap().await,
            "rate" => self.cmd_rate(&args),
            other => self.notice(&format!("Unknown command: {} (try 'help')", other)),
        }
        Ok(Flow::Continue)
    }

    // --- session commands ---

    fn cmd_login(&mut self, args: &[&str]) {
        let [username, password] = args else {
            return self.notice("Usage: login <username> <password>");
        };
        if self.session.is_some() {
            return self.notice("Already signed in; logout first");
        }
        match self.directory.authenticate(username, password) {
            Ok(session) => {
                self.event_bus.publish(MealcamEvent::SessionChanged {
                    username: session.username.clone(),
                    active: true,
                    timestamp: SystemTime::now(),
                });
                self.notice(&format!("Welcome to the {}", session.role.dashboard_title()));
                self.session = Some(session);
            }
            Err(e) => self.notice(&e.to_string()),
        }
    }

    fn cmd_logout(&mut self) {
        match self.session.take() {
            Some(session) => {
                // Leaving the dashboard drops any open detail view
                self.station.close_entry();
                self.event_bus.publish(MealcamEvent::SessionChanged {
                    username: session.username,
                    active: false,
                    timestamp: SystemTime::now(),
                });
                self.notice("Signed out");
            }
            None => self.notice("Not signed in"),
        }
    }

    fn cmd_whoami(&mut self) {
        match &self.session {
            Some(session) => {
                let text = format!("{} ({})", session.username, session.role);
                self.notice(&text);
            }
            None => self.notice("Not signed in"),
        }
    }

    fn cmd_theme(&mut self) {
        self.prefs.theme = self.prefs.theme.toggled();
        self.pref_store.save_best_effort(&self.prefs);
        self.event_bus.publish(MealcamEvent::ThemeChanged {
            theme: self.prefs.theme,
        });
        self.notice(&format!("Theme: {}", self.prefs.theme));
    }

    fn cmd_facing(&mut self) {
        self.prefs.camera_facing = self.prefs.camera_facing.toggled();
        self.surface.set_facing(self.prefs.camera_facing);
        self.pref_store.save_best_effort(&self.prefs);
        self.notice(&format!("Camera facing: {}", self.prefs.camera_facing));
    }

    // --- shared catalog view ---

    fn cmd_menu(&mut self, args: &[&str]) {
        if self.session.is_none() {
            return self.notice("Sign in first");
        }
        let items: Vec<String> = if let Some(query) = args.first() {
            self.catalog
                .search(query)
                .into_iter()
                .map(render_item)
                .collect()
        } else {
            self.catalog.items().iter().map(render_item).collect()
        };

        if items.is_empty() {
            self.notice("No food items found. Add some!");
        } else {
            for line in items {
                println!("  {}", line);
            }
        }
    }

    // --- staff dashboard ---

    fn cmd_track(&mut self, args: &[&str]) {
        if !self.require_role(Role::Staff) {
            return;
        }
        let [item_id, category] = args else {
            return self.notice("Usage: track <item-id> <breakfast|lunch|dinner|snacks>");
        };
        let Ok(category) = category.parse::<MealCategory>() else {
            return self.notice("Meal category must be breakfast, lunch, dinner, or snacks");
        };
        let Some(item) = self.catalog.get(item_id).cloned() else {
            return self.notice(&format!("No catalog item with id {}", item_id));
        };

        let entry = self.station.add_entry(&item, category);
        self.notice(&format!("Tracking {} under {} as {}", entry.name, category, entry.id));
    }

    fn cmd_meals(&mut self, args: &[&str]) {
        if !self.require_role(Role::Staff) {
            return;
        }
        let categories: Vec<MealCategory> = match args.first() {
            Some(raw) => match raw.parse() {
                Ok(category) => vec![category],
                Err(_) => return self.notice("Unknown meal category"),
            },
            None => MealCategory::ALL.to_vec(),
        };

        for category in categories {
            let entries = self.station.list_by_category(category);
            println!("  {} ({} items)", category, entries.len());
            for entry in entries {
                let images = self.station.entry_images(&entry.id).total_images();
                println!("    {} - {} ({} photos)", entry.id, entry.name, images);
            }
        }
    }

    fn cmd_open(&mut self, args: &[&str]) {
        if !self.require_role(Role::Staff) {
            return;
        }
        let Some(raw) = args.first() else {
            return self.notice("Usage: open <entry-id>");
        };
        let Some(entry_id) = self.parse_entry_id(raw) else {
            return self.notice(&format!("No tracked entry {}", raw));
        };
        match self.station.open_entry(&entry_id) {
            Ok(entry) => self.notice(&format!("Opened {} ({})", entry.name, entry.id)),
            Err(e) => self.notice(&friendly_error(&e)),
        }
    }

    fn cmd_close(&mut self) {
        if !self.require_role(Role::Staff) {
            return;
        }
        self.station.close_entry();
        self.notice("Closed detail view");
    }

    async fn cmd_shoot(&mut self, args: &[&str]) -> Result<()> {
        if !self.require_role(Role::Staff) {
            return Ok(());
        }
        let Some(raw) = args.first() else {
            self.notice("Usage: shoot <buffet|plate|container>");
            return Ok(());
        };
        let Ok(category) = raw.parse::<ImageCategory>() else {
            self.notice("Image category must be buffet, plate, or container");
            return Ok(());
        };

        // The detail view is replaced by the camera surface until the
        // capture resolves
        match self.station.capture(category).await {
            Ok(Some(artifact)) => self.notice(&format!("Saved {} photo: {}", category, artifact)),
            Ok(None) => self.notice("Capture cancelled"),
            Err(e) => self.notice(&friendly_error(&e)),
        }
        Ok(())
    }

    fn cmd_measure(&mut self, args: &[&str]) {
        if !self.require_role(Role::Staff) {
            return;
        }
        if self.station.active_entry().is_none() {
            return self.notice("Open a tracked item before measuring");
        }
        let (weight, volume) = match args {
            [weight] => (*weight, ""),
            [weight, volume] => (*weight, *volume),
            _ => return self.notice("Usage: measure <weight-g> [volume-ml]"),
        };

        match self.station.measure(weight, volume) {
            Ok(outcome) => match outcome.density() {
                Some(density) => self.notice(&format!("Density: {:.3} g/ml", density)),
                None => self.notice(&format!(
                    "Weight recorded: {} g (no volume, density not computed)",
                    outcome.weight()
                )),
            },
            Err(e) => self.notice(&e.to_string()),
        }
    }

    fn cmd_photos(&mut self, args: &[&str]) {
        if !self.require_role(Role::Staff) {
            return;
        }
        let entry_id = match args.first() {
            Some(raw) => self.parse_entry_id(raw),
            None => self.station.active_entry().map(|entry| entry.id.clone()),
        };
        let Some(entry_id) = entry_id else {
            return self.notice("Usage: photos [entry-id] (or open an entry first)");
        };

        let bucket = self.station.entry_images(&entry_id);
        for category in ImageCategory::ALL {
            let images = bucket.images(category);
            println!("  {} ({})", category, images.len());
            for artifact in images {
                println!("    {}", artifact);
            }
        }
    }

    // --- admin dashboard ---

    fn cmd_add_item(&mut self, line: &str) {
        if !self.require_role(Role::Admin) {
            return;
        }
        let rest = line.splitn(2, char::is_whitespace).nth(1).unwrap_or("");
        let (name, description) = split_description(rest);
        match self.catalog.add(name, description) {
            Ok(item) => self.notice(&format!("Added {} as {}", item.name, item.id)),
            Err(e) => self.notice(&e.to_string()),
        }
    }

    fn cmd_edit_item(&mut self, line: &str) {
        if !self.require_role(Role::Admin) {
            return;
        }
        let rest = line.splitn(2, char::is_whitespace).nth(1).unwrap_or("");
        let Some((item_id, rest)) = rest.split_once(char::is_whitespace) else {
            return self.notice("Usage: edititem <item-id> <name> [-- description]");
        };
        let (name, description) = split_description(rest);
        match self.catalog.update(item_id, name, description) {
            Ok(()) => self.notice("Item updated"),
            Err(e) => self.notice(&e.to_string()),
        }
    }

    fn cmd_del_item(&mut self, args: &[&str]) {
        if !self.require_role(Role::Admin) {
            return;
        }
        let Some(item_id) = args.first() else {
            return self.notice("Usage: delitem <item-id>");
        };
        match self.catalog.remove(item_id) {
            Ok(item) => self.notice(&format!("Deleted {}", item.name)),
            Err(e) => self.notice(&e.to_string()),
        }
    }

    // --- nutritionist dashboard ---

    fn cmd_facts(&mut self, args: &[&str]) {
        if !self.require_role(Role::Nutritionist) {
            return;
        }
        let [item_id, calories, protein, carbs, fat] = args else {
            return self.notice("Usage: facts <item-id> <calories> <protein-g> <carbs-g> <fat-g>");
        };
        let Some(name) = self.catalog.get(item_id).map(|item| item.name.clone()) else {
            return self.notice(&format!("No catalog item with id {}", item_id));
        };

        match self
            .catalog
            .update_facts(item_id, &name, calories, protein, carbs, fat)
        {
            Ok(()) => self.notice(&format!("Nutrition facts updated for {}", name)),
            Err(e) => self.notice(&e.to_string()),
        }
    }

    // --- user dashboard ---

    async fn cmd_snap(&mut self) {
        if !self.require_role(Role::User) {
            return;
        }
        match self.surface.snapshot().await {
            CaptureOutcome::Captured(artifact) => {
                self.notice(&format!("Captured {}", artifact));
                self.analysis.new_photo(artifact);
                self.notice("Analyzing image...");
                if let Some(result) = self.analysis.analyze().await {
                    self.notice(&format!(
                        "Model Confidence: {:.0}%",
                        result.confidence_percent()
                    ));
                    self.notice(&format!("Nutritional Values: {}", result.summary()));
                    self.notice("Rate this analysis with 'rate <1-5>'");
                }
            }
            CaptureOutcome::Cancelled => self.notice("Capture cancelled"),
            CaptureOutcome::Failed { details } => {
                warn!("Snapshot failed: {}", details);
                self.notice("Could not analyze image.");
            }
        }
    }

    fn cmd_rate(&mut self, args: &[&str]) {
        if !self.require_role(Role::User) {
            return;
        }
        let Some(stars) = args.first().and_then(|raw| raw.parse::<u8>().ok()) else {
            return self.notice("Usage: rate <1-5>");
        };
        match self.analysis.rate(stars) {
            Ok(()) => self.notice(&format!(
                "You rated {} stars. Thank you for your feedback!",
                stars
            )),
            Err(e) => self.notice(&e.to_string()),
        }
    }

    // --- helpers ---

    fn cmd_help(&mut self) {
        println!("  General : help, login <user> <pass>, logout, whoami, theme, facing, quit");
        println!("  Any role: menu [query]");
        println!("  Staff   : track <item-id> <meal>, meals [meal], open <entry-id>, close,");
        println!("            shoot <buffet|plate|container>, measure <weight> [volume], photos [entry-id]");
        println!("  Admin   : additem <name> [-- description], edititem <id> <name> [-- description], delitem <id>");
        println!("  Nutri   : facts <item-id> <calories> <protein> <carbs> <fat>");
        println!("  User    : snap, rate <1-5>");
    }

    fn print_banner(&self) {
        println!("Mealcam v{}", env!("CARGO_PKG_VERSION"));
        println!(
            "Theme: {} | Camera: {} | Demo accounts: {}",
            self.prefs.theme,
            self.prefs.camera_facing,
            self.directory.usernames().join(", ")
        );
        println!("Type 'help' for commands.");
    }

    fn prompt(&self) {
        use std::io::Write;
        let who = self
            .session
            .as_ref()
            .map(|s| s.username.as_str())
            .unwrap_or("guest");
        print!("{}> ", who);
        let _ = std::io::stdout().flush();
    }

    fn require_role(&mut self, role: Role) -> bool {
        match &self.session {
            Some(session) if session.role == role => true,
            Some(session) => {
                let text = format!("That command needs the {} role (you are {})", role, session.role);
                self.notice(&text);
                false
            }
            None => {
                self.notice("Sign in first");
                false
            }
        }
    }

    fn parse_entry_id(&self, raw: &str) -> Option<EntryId> {
        // Entry ids render as "<base>-<stamp>"; match against what the
        // ledger actually holds rather than re-parsing
        self.station
            .entries()
            .iter()
            .find(|entry| entry.id.to_string() == raw)
            .map(|entry| entry.id.clone())
    }

    fn render_event(&self, event: &MealcamEvent) {
        println!();
        println!("* {}", event.description());
        self.prompt();
    }

    fn notice(&self, text: &str) {
        println!("  {}", text);
    }
}

fn render_item(item: &crate::catalog::CatalogItem) -> String {
    let facts = item
        .facts
        .map(|facts| format!(" [{}]", facts))
        .unwrap_or_default();
    match &item.description {
        Some(description) => format!("{} - {}{} ({})", item.id, item.name, facts, description),
        None => format!("{} - {}{}", item.id, item.name, facts),
    }
}

/// Split "name words -- description words" into its two halves.
fn split_description(rest: &str) -> (&str, Option<&str>) {
    match rest.split_once("--") {
        Some((name, description)) => (name.trim(), Some(description.trim())),
        None => (rest.trim(), None),
    }
}

fn friendly_error(error: &MealcamError) -> String {
    match error {
        MealcamError::Capture(e) => e.user_message(),
        MealcamError::Bucket(e) => e.to_string(),
        MealcamError::Measurement(e) => e.to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app() -> MealcamApp {
        let mut config = MealcamConfig::default();
        config.analyzer.delay_ms = 5;
        let dir = tempfile::tempdir().unwrap();
        config.preferences.path = dir
            .path()
            .join("prefs.toml")
            .to_string_lossy()
            .into_owned();
        MealcamApp::new(config)
    }

    #[tokio::test]
    async fn test_login_gates_dashboards() {
        let mut app = app();

        // Staff command without a session
        app.dispatch("track item-1 lunch").await.unwrap();
        assert!(app.session.is_none());

        app.dispatch("login staff staff123").await.unwrap();
        assert_eq!(app.session.as_ref().unwrap().role, Role::Staff);

        // Wrong role is refused but session stays
        app.dispatch("additem Pulao").await.unwrap();
        assert_eq!(app.catalog.search("Pulao").len(), 0);

        app.dispatch("logout").await.unwrap();
        assert!(app.session.is_none());
    }

    #[tokio::test]
    async fn test_staff_track_open_shoot_flow() {
        let mut app = app();
        app.dispatch("login staff staff123").await.unwrap();

        let item_id = app.catalog.search("Roti")[0].id.clone();
        app.dispatch(&format!("track {} lunch", item_id)).await.unwrap();

        let entries = app.station.list_by_category(MealCategory::Lunch);
        assert_eq!(entries.len(), 1);
        let entry_id = entries[0].id.clone();

        app.dispatch(&format!("open {}", entry_id)).await.unwrap();
        app.dispatch("shoot plate").await.unwrap();

        let bucket = app.station.entry_images(&entry_id);
        assert_eq!(bucket.images(ImageCategory::Plate).len(), 1);
    }

    #[tokio::test]
    async fn test_admin_crud_commands() {
        let mut app = app();
        app.dispatch("login admin admin123").await.unwrap();

        app.dispatch("additem Veg Pulao -- Rice with vegetables")
            .await
            .unwrap();
        let added = app.catalog.search("Veg Pulao");
        assert_eq!(added.len(), 1);
        assert_eq!(added[0].description.as_deref(), Some("Rice with vegetables"));

        let id = added[0].id.clone();
        app.dispatch(&format!("edititem {} Jeera Pulao", id)).await.unwrap();
        assert_eq!(app.catalog.get(&id).unwrap().name, "Jeera Pulao");

        app.dispatch(&format!("delitem {}", id)).await.unwrap();
        assert!(app.catalog.get(&id).is_none());
    }

    #[tokio::test]
    async fn test_nutritionist_facts_command() {
        let mut app = app();
        app.dispatch("login nutri nutri123").await.unwrap();

        let id = app.catalog.search("Idli")[0].id.clone();
        app.dispatch(&format!("facts {} 39 2 8 0.2", id)).await.unwrap();

        let facts = app.catalog.get(&id).unwrap().facts.unwrap();
        assert_eq!(facts.calories, 39.0);

        // A bad value leaves facts untouched
        app.dispatch(&format!("facts {} lots 2 8 0.2", id)).await.unwrap();
        assert_eq!(app.catalog.get(&id).unwrap().facts.unwrap().calories, 39.0);
    }

    #[tokio::test]
    async fn test_user_snap_and_rate() {
        let mut app = app();
        app.dispatch("login user user123").await.unwrap();

        app.dispatch("snap").await.unwrap();
        assert!(app.analysis.result().is_some());

        app.dispatch("rate 4").await.unwrap();
        assert_eq!(app.analysis.rating(), Some(4));

        // Out of range is rejected
        app.dispatch("rate 9").await.unwrap();
        assert_eq!(app.analysis.rating(), Some(4));
    }

    #[tokio::test]
    async fn test_theme_toggle_round_trip() {
        let mut app = app();
        assert_eq!(app.prefs.theme, crate::prefs::Theme::Light);
        app.dispatch("theme").await.unwrap();
        assert_eq!(app.prefs.theme, crate::prefs::Theme::Dark);
        app.dispatch("theme").await.unwrap();
        assert_eq!(app.prefs.theme, crate::prefs::Theme::Light);
    }
}
