use crate::aam::client::load_feed_file;
use crate::aam::{AamClient, UpdateSource};
use crate::cache::UpdateCache;
use crate::config::Config;
use crate::error::{AamError, Result};
use crate::feed::{Feed, Resolution, ResolvedUpdate};
use crate::munki::{self, find_cc_packages, CcPackage, ImportRequest, MunkiTools};
use colored::Colorize;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Flags for the `sync` command
#[derive(Debug, Clone, Default)]
pub struct SyncOptions {
    pub munkiimport: bool,
    pub include_revoked: bool,
    pub force_import: bool,
    pub feed_file: Option<PathBuf>,
}

/// What happened to a single resolved update during a sync
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    NoInstaller,
    Downloaded(PathBuf),
    Cached(PathBuf),
    Imported,
    AlreadyInRepo,
    ImportFailed,
    /// The payload came back shorter or longer than the details document says
    IncompleteDownload { expected: u64, received: u64 },
}

#[derive(Debug, Default)]
struct SyncSummary {
    downloaded: usize,
    cached: usize,
    imported: usize,
    already_in_repo: usize,
    skipped: usize,
    failed: usize,
}

impl SyncSummary {
    fn record(&mut self, outcome: &UpdateOutcome) {
        match outcome {
            UpdateOutcome::NoInstaller => self.skipped += 1,
            UpdateOutcome::Downloaded(_) => self.downloaded += 1,
            UpdateOutcome::Cached(_) => self.cached += 1,
            UpdateOutcome::Imported => self.imported += 1,
            UpdateOutcome::AlreadyInRepo => self.already_in_repo += 1,
            UpdateOutcome::ImportFailed | UpdateOutcome::IncompleteDownload { .. } => {
                self.failed += 1
            }
        }
    }
}

/// Shared state for processing the resolved updates of one run
struct SyncContext<'a> {
    source: &'a dyn UpdateSource,
    cache: &'a UpdateCache,
    config: &'a Config,
    munki: Option<&'a MunkiTools>,
    force_import: bool,
}

/// Execute the sync workflow: fetch, filter, download and optionally import
pub fn execute_sync<P: AsRef<Path>>(config_path: P, options: SyncOptions) -> Result<()> {
    println!("{}", "Mirroring Adobe AAM updates...".cyan().bold());

    // Step 1: Load configuration
    println!("\n{}", "1. Loading configuration...".yellow());
    let config = load_config(config_path.as_ref())?;
    config.ensure_products()?;
    print_products(&config);

    // Step 2: Munki sanity checks, before anything is downloaded
    let munki_tools = if options.munkiimport {
        println!("\n{}", "2. Checking Munki installation...".yellow());
        let tools = MunkiTools::locate(&config.munki_dir, config.munki_repo_path.as_deref())?;
        match tools.repo_path() {
            Some(repo) => println!("   Repo: {}", repo.display().to_string().dimmed()),
            None => println!(
                "   {}",
                "⚠ Munki repo path unknown, duplicate detection is disabled".yellow()
            ),
        }
        println!("{}", "✓ Munki is configured".green());
        Some(tools)
    } else {
        println!("\n{}", "2. Skipping Munki checks (no --munkiimport)".yellow());
        None
    };

    // Step 3: Prepare the download cache
    println!("\n{}", "3. Preparing local cache...".yellow());
    let cache = UpdateCache::open(config.cache_dir())?;
    println!("   {}", cache.root().display().to_string().dimmed());

    // Step 4: Read and resolve the feed
    println!("\n{}", "4. Reading updater feed...".yellow());
    let client = AamClient::new(config.feed_base_url(), config.updates_base_url())?;
    let feed = read_feed(&client, options.feed_file.as_deref(), false)?;
    let resolution = feed.resolve(&config.products, options.include_revoked);
    print_resolution_notes(&config, &resolution);
    println!(
        "{}",
        format!("✓ {} update(s) to process", resolution.updates.len()).green()
    );

    // Step 5: Download and import
    println!("\n{}", "5. Processing updates...".yellow());
    let context = SyncContext {
        source: &client,
        cache: &cache,
        config: &config,
        munki: munki_tools.as_ref(),
        force_import: options.force_import,
    };
    let summary = process_updates(&context, &resolution.updates);

    print_sync_summary(&summary, resolution.revoked.len());

    if summary.failed > 0 {
        return Err(AamError::UpdatesFailed(summary.failed));
    }

    println!("\n{}", "✨ Sync completed successfully!".green().bold());
    Ok(())
}

fn process_updates(context: &SyncContext<'_>, updates: &[ResolvedUpdate]) -> SyncSummary {
    let mut summary = SyncSummary::default();

    for update in updates {
        println!(
            "\n{} {}, {}...",
            "Update".bold(),
            update.product.white().bold(),
            update.version.cyan()
        );

        match process_update(context, update) {
            Ok(outcome) => summary.record(&outcome),
            Err(e) => {
                println!("   {} {}", "✗".red(), e.to_string().red());
                summary.failed += 1;
            }
        }
    }

    summary
}

fn process_update(context: &SyncContext<'_>, update: &ResolvedUpdate) -> Result<UpdateOutcome> {
    if update.revoked {
        println!("   {}", "⚠ Update is revoked, processing anyway".yellow());
    }

    let details = context
        .source
        .fetch_details(&update.product, &update.version)?;

    let Some(installer) = &details.installer else {
        println!(
            "   {}",
            "No installer file listed for this update. Skipping update.".yellow()
        );
        return Ok(UpdateOutcome::NoInstaller);
    };

    let path = context
        .cache
        .installer_path(&update.product, &update.version);
    let downloaded = if context.cache.needs_download(&path, installer.size) {
        if path.exists() {
            println!("   {}", "Incomplete download, re-starting.".yellow());
        }
        let url = context
            .source
            .installer_url(&update.product, &update.version, &installer.name);
        println!("   Downloading update at {}", url.dimmed());

        let written = context.source.download(&url, &path, installer.size)?;
        if written != installer.size {
            println!(
                "   {}",
                format!(
                    "✗ Expected {} bytes but received {}. Skipping update.",
                    installer.size, written
                )
                .red()
            );
            return Ok(UpdateOutcome::IncompleteDownload {
                expected: installer.size,
                received: written,
            });
        }
        true
    } else {
        println!(
            "   Skipping download of {}, we already have it.",
            update.product
        );
        false
    };

    let Some(munki_tools) = context.munki else {
        return Ok(if downloaded {
            UpdateOutcome::Downloaded(path)
        } else {
            UpdateOutcome::Cached(path)
        });
    };

    let item_name = munki::item_name(&update.product, &context.config.pkginfo_name_suffix);

    if !context.force_import {
        println!("   Looking for a matching pkginfo in the repo...");
        if let Some(item) = munki_tools.find_matching_item(&item_name, &path)? {
            println!(
                "   {}",
                format!(
                    "We already have an exact match in the repo ({} {}). Skipping import.",
                    item.name,
                    item.version.as_deref().unwrap_or("?")
                )
                .green()
            );
            return Ok(UpdateOutcome::AlreadyInRepo);
        }
    }

    let fallback_name = format!("{} {}", update.product, update.version);
    let request = ImportRequest {
        item_name: &item_name,
        display_name: details.display_name.as_deref().unwrap_or(fallback_name.as_str()),
        description: details.description.as_deref(),
        update_for: &update.update_for,
        installer: &path,
    };
    let args = munki::build_import_args(&context.config.munkiimport_options, &request);

    if update.update_for.is_empty() {
        println!("   {}", "No base products apply to this update".yellow());
    } else {
        println!(
            "   Applicable base products for Munki: {}",
            update.update_for.join(", ").bright_cyan()
        );
    }
    println!(
        "   Calling munkiimport on {} version {}, file {}.",
        update.product,
        update.version,
        path.display()
    );

    if !munki_tools.import(&args)? {
        println!(
            "   {}",
            "munkiimport returned an error. Skipping update.".red()
        );
        return Ok(UpdateOutcome::ImportFailed);
    }

    // Later channels check the catalogs for this item, so rebuild right away
    if !munki_tools.make_catalogs()? {
        println!("   {}", "⚠ makecatalogs returned an error".yellow());
    }

    println!("   {}", "✓ Imported into Munki".green());
    Ok(UpdateOutcome::Imported)
}

fn print_sync_summary(summary: &SyncSummary, revoked: usize) {
    println!("\n{}", "📦 Summary:".cyan().bold());
    println!("  • Downloaded: {}", summary.downloaded.to_string().green());
    println!("  • Already cached: {}", summary.cached);
    if summary.imported > 0 || summary.already_in_repo > 0 {
        println!("  • Imported: {}", summary.imported.to_string().green());
        println!("  • Already in repo: {}", summary.already_in_repo);
    }
    if summary.skipped > 0 {
        println!("  • Skipped (no installer): {}", summary.skipped);
    }
    if revoked > 0 {
        println!("  • Revoked: {}", revoked.to_string().yellow());
    }
    if summary.failed > 0 {
        println!("  • Failed: {}", summary.failed.to_string().red());
    }
}

#[derive(Debug, Serialize)]
struct CheckReport<'a> {
    generated_at: jiff::Timestamp,
    feed_source: String,
    include_revoked: bool,
    #[serde(flatten)]
    resolution: &'a Resolution,
}

/// Execute the check workflow (dry-run)
pub fn execute_check<P: AsRef<Path>>(
    config_path: P,
    include_revoked: bool,
    feed_file: Option<&Path>,
    json: bool,
) -> Result<()> {
    let config = load_config(config_path.as_ref())?;
    config.ensure_products()?;
    let client = AamClient::new(config.feed_base_url(), config.updates_base_url())?;

    if json {
        let feed = read_feed(&client, feed_file, true)?;
        let resolution = feed.resolve(&config.products, include_revoked);
        let report = CheckReport {
            generated_at: jiff::Timestamp::now(),
            feed_source: feed_file
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| client.feed_url()),
            include_revoked,
            resolution: &resolution,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("{}", "Checking for available Adobe updates...".cyan().bold());

    println!("\n{}", "1. Loading configuration...".yellow());
    print_products(&config);

    println!("\n{}", "2. Reading updater feed...".yellow());
    let feed = read_feed(&client, feed_file, false)?;
    let resolution = feed.resolve(&config.products, include_revoked);
    print_resolution_notes(&config, &resolution);
    println!("{}", "✓ Check completed".green());

    print_available_updates(&resolution);
    Ok(())
}

fn print_available_updates(resolution: &Resolution) {
    if resolution.is_empty() {
        println!("\n{}", "No updates available for the configured products".yellow());
        return;
    }

    println!("\n{}", "📦 Available Updates:".cyan().bold());
    println!(
        "{}",
        format!("Found {} update(s)", resolution.updates.len()).yellow()
    );

    for update in &resolution.updates {
        let marker = if update.revoked {
            " (revoked)".red().to_string()
        } else {
            String::new()
        };
        println!(
            "  • {} {}{}",
            update.product.white().bold(),
            update.version.green().bold(),
            marker
        );
        println!("      channels: {}", update.channels.join(", ").dimmed());
        if !update.update_for.is_empty() {
            println!("      update for: {}", update.update_for.join(", ").bright_cyan());
        }
    }

    println!("\n{}", "To download these updates, run:".dimmed());
    println!("  {}", "aamporter sync".cyan());
}

/// Execute the Creative Cloud package import workflow
pub fn execute_import_cc<P: AsRef<Path>>(config_path: P, packages_dir: &Path) -> Result<()> {
    println!(
        "{}",
        "Importing Creative Cloud packages into Munki...".cyan().bold()
    );

    println!("\n{}", "1. Loading configuration...".yellow());
    let config_path = config_path.as_ref();
    let config = if config_path.exists() {
        load_config(config_path)?
    } else {
        println!(
            "   {}",
            format!(
                "{} not found, using default munkiimport options",
                config_path.display()
            )
            .dimmed()
        );
        Config::fallback()
    };

    println!("\n{}", "2. Checking Munki installation...".yellow());
    let tools = MunkiTools::locate(&config.munki_dir, config.munki_repo_path.as_deref())?;
    println!("{}", "✓ Munki is configured".green());

    println!("\n{}", "3. Scanning package builds...".yellow());
    let packages_dir = packages_dir.canonicalize().map_err(|e| {
        AamError::Munki(format!(
            "Invalid packages directory '{}': {e}",
            packages_dir.display()
        ))
    })?;
    let packages = find_cc_packages(&packages_dir)?;
    println!("   Found {} package build(s)", packages.len());

    println!("\n{}", "4. Importing packages...".yellow());
    let failed = import_cc_packages(&tools, &packages, &config.cc_munkiimport_options)?;

    if failed > 0 {
        return Err(AamError::UpdatesFailed(failed));
    }

    println!("\n{}", "✨ Import completed successfully!".green().bold());
    Ok(())
}

/// Run munkiimport for each CCP build, returning how many imports failed
fn import_cc_packages(
    tools: &MunkiTools,
    packages: &[CcPackage],
    options: &[String],
) -> Result<usize> {
    let mut failed = 0;
    for package in packages {
        println!("\n{} {}", "Package".bold(), package.product.white().bold());
        if package.uninstaller.is_none() {
            println!("   {}", "⚠ No uninstaller package found".yellow());
        }

        let args = package.import_args(options);
        if tools.import(&args)? {
            println!("   {}", "✓ Imported".green());
        } else {
            println!("   {}", "munkiimport returned an error".red());
            failed += 1;
        }
    }

    Ok(failed)
}

fn load_config(path: &Path) -> Result<Config> {
    let config = Config::load(path)?;
    if std::env::var("AAMPORTER_VERBOSE").is_ok() {
        eprintln!("[VERBOSE] Loaded configuration from {}", path.display());
    }
    Ok(config)
}

fn read_feed(client: &AamClient, feed_file: Option<&Path>, quiet: bool) -> Result<Feed> {
    let text = match feed_file {
        Some(path) => {
            if !quiet {
                println!("   Reading feed from {}", path.display().to_string().dimmed());
            }
            load_feed_file(path)?
        }
        None => {
            if !quiet {
                println!("   Fetching {}", client.feed_url().dimmed());
            }
            client.fetch_feed()?
        }
    };

    let feed = Feed::parse(&text);
    if feed.is_empty() {
        return Err(AamError::Feed(
            "The updater feed contained no update entries".to_string(),
        ));
    }

    if !quiet {
        let revocations = feed.entries().iter().filter(|e| e.revoked).count();
        println!(
            "   Found {} feed entries ({} revocations)",
            feed.len(),
            revocations
        );
    }
    Ok(feed)
}

fn print_products(config: &Config) {
    println!("   Found {} product(s):", config.products.len());
    for product in &config.products {
        println!(
            "   • {} ({})",
            product.name.bright_cyan(),
            product.channels.join(", ").dimmed()
        );
    }
}

fn print_resolution_notes(config: &Config, resolution: &Resolution) {
    for channel in &resolution.empty_channels {
        println!(
            "   {}",
            format!(
                "No updates for channel {} ({})",
                channel,
                config.base_products_for_channel(channel).join(", ")
            )
            .dimmed()
        );
    }
    for entry in &resolution.revoked {
        println!(
            "   {}",
            format!(
                "Update {}, {} is revoked. Skipping update.",
                entry.product, entry.version
            )
            .yellow()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aam::details::InstallerFile;
    use crate::aam::UpdateDetails;
    use std::cell::RefCell;
    use std::fs;
    use tempfile::tempdir;

    /// Serves canned details and writes fake payloads
    struct FakeSource {
        details: Vec<(String, Option<u64>)>,
        downloads: RefCell<Vec<String>>,
        /// Payload bytes actually written, regardless of the advertised size
        served_bytes: Option<u64>,
    }

    impl FakeSource {
        fn new(details: &[(&str, Option<u64>)]) -> Self {
            Self {
                details: details
                    .iter()
                    .map(|(product, size)| (product.to_string(), *size))
                    .collect(),
                downloads: RefCell::new(Vec::new()),
                served_bytes: None,
            }
        }

        fn serving(mut self, bytes: u64) -> Self {
            self.served_bytes = Some(bytes);
            self
        }
    }

    impl UpdateSource for FakeSource {
        fn fetch_feed(&self) -> Result<String> {
            Ok(String::new())
        }

        fn fetch_details(&self, product: &str, _version: &str) -> Result<UpdateDetails> {
            let (_, size) = self
                .details
                .iter()
                .find(|(p, _)| p == product)
                .ok_or_else(|| AamError::Http(format!("HTTP 404: {product}")))?;
            Ok(UpdateDetails {
                display_name: Some(format!("{product} update")),
                description: None,
                installer: size.map(|size| InstallerFile {
                    name: format!("{product}.dmg"),
                    size,
                }),
            })
        }

        fn installer_url(&self, product: &str, version: &str, file_name: &str) -> String {
            format!("http://updates.test/{product}/{version}/{file_name}")
        }

        fn download(&self, url: &str, dest: &Path, expected_size: u64) -> Result<u64> {
            self.downloads.borrow_mut().push(url.to_string());
            let size = self.served_bytes.unwrap_or(expected_size);
            fs::write(dest, vec![0u8; size as usize])?;
            Ok(size)
        }
    }

    fn update(product: &str, version: &str) -> ResolvedUpdate {
        ResolvedUpdate {
            product: product.to_string(),
            version: version.to_string(),
            channels: vec!["Channel".to_string()],
            update_for: vec!["Base".to_string()],
            revoked: false,
        }
    }

    fn config() -> Config {
        Config::from_toml("[[products]]\nname = \"Base\"\nchannels = [\"Channel\"]\n").unwrap()
    }

    #[test]
    fn downloads_missing_payloads_and_reuses_complete_ones() {
        let dir = tempdir().unwrap();
        let cache = UpdateCache::open(dir.path()).unwrap();
        let config = config();
        let source = FakeSource::new(&[("ProdA", Some(8)), ("ProdB", Some(4))]);
        fs::write(cache.installer_path("ProdB", "2.0"), "abcd").unwrap();

        let context = SyncContext {
            source: &source,
            cache: &cache,
            config: &config,
            munki: None,
            force_import: false,
        };

        let outcome = process_update(&context, &update("ProdA", "1.0")).unwrap();
        assert_eq!(
            outcome,
            UpdateOutcome::Downloaded(dir.path().join("ProdA-1.0.dmg"))
        );
        let outcome = process_update(&context, &update("ProdB", "2.0")).unwrap();
        assert_eq!(outcome, UpdateOutcome::Cached(dir.path().join("ProdB-2.0.dmg")));

        assert_eq!(
            *source.downloads.borrow(),
            vec!["http://updates.test/ProdA/1.0/ProdA.dmg"]
        );
    }

    #[test]
    fn redownloads_incomplete_payloads() {
        let dir = tempdir().unwrap();
        let cache = UpdateCache::open(dir.path()).unwrap();
        let config = config();
        let source = FakeSource::new(&[("ProdA", Some(8))]);
        fs::write(cache.installer_path("ProdA", "1.0"), "abc").unwrap();

        let context = SyncContext {
            source: &source,
            cache: &cache,
            config: &config,
            munki: None,
            force_import: false,
        };

        process_update(&context, &update("ProdA", "1.0")).unwrap();
        assert_eq!(source.downloads.borrow().len(), 1);
        assert_eq!(
            fs::metadata(cache.installer_path("ProdA", "1.0")).unwrap().len(),
            8
        );
    }

    #[test]
    fn failures_are_counted_and_processing_continues() {
        let dir = tempdir().unwrap();
        let cache = UpdateCache::open(dir.path()).unwrap();
        let config = config();
        let source = FakeSource::new(&[("Meta", None), ("ProdB", Some(2))]);

        let context = SyncContext {
            source: &source,
            cache: &cache,
            config: &config,
            munki: None,
            force_import: false,
        };

        let updates = vec![
            update("Missing", "1.0"),
            update("Meta", "1.0"),
            update("ProdB", "1.0"),
        ];
        let summary = process_updates(&context, &updates);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.downloaded, 1);
    }

    /// Munki directory whose tools append their name and argv to `calls.log`
    #[cfg(unix)]
    fn stub_munki(root: &Path, munkiimport_exit: i32) -> (PathBuf, PathBuf) {
        use std::os::unix::fs::PermissionsExt;

        let munki_dir = root.join("munki");
        fs::create_dir_all(&munki_dir).unwrap();
        let log = root.join("calls.log");
        for (tool, exit) in [("munkiimport", munkiimport_exit), ("makecatalogs", 0)] {
            let path = munki_dir.join(tool);
            fs::write(
                &path,
                format!(
                    "#!/bin/sh\necho \"{tool} $*\" >> \"{}\"\nexit {exit}\n",
                    log.display()
                ),
            )
            .unwrap();
            fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        }
        (munki_dir, log)
    }

    fn calls(log: &Path) -> Vec<String> {
        fs::read_to_string(log)
            .map(|s| s.lines().map(str::to_string).collect())
            .unwrap_or_default()
    }

    /// Repo whose `all` catalog holds `name` with the hash of `payload`
    fn repo_with_item(root: &Path, name: &str, payload: &Path) -> PathBuf {
        let repo = root.join("repo");
        fs::create_dir_all(repo.join("catalogs")).unwrap();
        let hash = munki::sha256_file(payload).unwrap();
        fs::write(
            repo.join("catalogs/all"),
            format!(
                "<plist version=\"1.0\"><array><dict><key>name</key><string>{name}</string><key>version</key><string>1.0</string><key>installer_item_hash</key><string>{hash}</string></dict></array></plist>"
            ),
        )
        .unwrap();
        repo
    }

    #[cfg(unix)]
    #[test]
    fn truncated_download_is_not_imported() {
        let dir = tempdir().unwrap();
        let cache = UpdateCache::open(dir.path().join("cache")).unwrap();
        let config = config();
        let source = FakeSource::new(&[("ProdA", Some(100))]).serving(10);
        let (munki_dir, log) = stub_munki(dir.path(), 0);
        let tools = MunkiTools::new(&munki_dir, None);

        let context = SyncContext {
            source: &source,
            cache: &cache,
            config: &config,
            munki: Some(&tools),
            force_import: true,
        };

        let summary = process_updates(&context, &[update("ProdA", "1.0")]);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.imported, 0);
        assert_eq!(
            process_update(&context, &update("ProdA", "1.0")).unwrap(),
            UpdateOutcome::IncompleteDownload {
                expected: 100,
                received: 10,
            }
        );
        assert!(calls(&log).is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn exact_repo_match_skips_import() {
        let dir = tempdir().unwrap();
        let cache = UpdateCache::open(dir.path().join("cache")).unwrap();
        let config = config();
        let source = FakeSource::new(&[("ProdA", Some(8))]);
        let payload = cache.installer_path("ProdA", "1.0");
        fs::write(&payload, [0u8; 8]).unwrap();
        let repo = repo_with_item(dir.path(), "ProdA", &payload);
        let (munki_dir, log) = stub_munki(dir.path(), 0);
        let tools = MunkiTools::new(&munki_dir, Some(repo));

        let context = SyncContext {
            source: &source,
            cache: &cache,
            config: &config,
            munki: Some(&tools),
            force_import: false,
        };

        let outcome = process_update(&context, &update("ProdA", "1.0")).unwrap();
        assert_eq!(outcome, UpdateOutcome::AlreadyInRepo);
        assert!(source.downloads.borrow().is_empty());
        assert!(calls(&log).is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn force_import_bypasses_repo_match_and_rebuilds_catalogs() {
        let dir = tempdir().unwrap();
        let cache = UpdateCache::open(dir.path().join("cache")).unwrap();
        let config = config();
        let source = FakeSource::new(&[("ProdA", Some(8))]);
        let payload = cache.installer_path("ProdA", "1.0");
        fs::write(&payload, [0u8; 8]).unwrap();
        let repo = repo_with_item(dir.path(), "ProdA", &payload);
        let (munki_dir, log) = stub_munki(dir.path(), 0);
        let tools = MunkiTools::new(&munki_dir, Some(repo.clone()));

        let context = SyncContext {
            source: &source,
            cache: &cache,
            config: &config,
            munki: Some(&tools),
            force_import: true,
        };

        let outcome = process_update(&context, &update("ProdA", "1.0")).unwrap();
        assert_eq!(outcome, UpdateOutcome::Imported);

        let calls = calls(&log);
        assert_eq!(calls.len(), 2);
        assert!(calls[0].starts_with("munkiimport --nointeractive --subdirectory apps/Adobe/CS_Updates --update_for Base --name ProdA --displayname ProdA update"));
        assert!(calls[0].ends_with("ProdA-1.0.dmg"));
        assert_eq!(calls[1], format!("makecatalogs {}", repo.display()));
    }

    #[cfg(unix)]
    #[test]
    fn failed_import_skips_catalog_rebuild() {
        let dir = tempdir().unwrap();
        let cache = UpdateCache::open(dir.path().join("cache")).unwrap();
        let config = config();
        let source = FakeSource::new(&[("ProdA", Some(8))]);
        let (munki_dir, log) = stub_munki(dir.path(), 1);
        let tools = MunkiTools::new(&munki_dir, None);

        let context = SyncContext {
            source: &source,
            cache: &cache,
            config: &config,
            munki: Some(&tools),
            force_import: false,
        };

        let summary = process_updates(&context, &[update("ProdA", "1.0")]);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.imported, 0);

        let calls = calls(&log);
        assert_eq!(calls.len(), 1);
        assert!(calls[0].starts_with("munkiimport "));
    }

    #[cfg(unix)]
    #[test]
    fn imports_cc_builds_with_uninstallers() {
        let dir = tempdir().unwrap();
        let builds = dir.path().join("builds");
        for product in ["AdobeAuditionCC2014", "AdobeMuseCC2014"] {
            let build = builds.join(product).join("Build");
            fs::create_dir_all(build.join(format!("{product}_Install.pkg"))).unwrap();
            fs::create_dir_all(build.join(format!("{product}_Uninstall.pkg"))).unwrap();
        }
        let packages = find_cc_packages(&builds).unwrap();
        let options = crate::config::default_cc_munkiimport_options();

        let (munki_dir, log) = stub_munki(dir.path(), 0);
        let tools = MunkiTools::new(&munki_dir, None);
        assert_eq!(import_cc_packages(&tools, &packages, &options).unwrap(), 0);

        let calls = calls(&log);
        assert_eq!(calls.len(), 2);
        assert!(calls[0].starts_with(
            "munkiimport --nointeractive --subdirectory apps/Adobe/CC/2014 --developer Adobe --category Creativity --uninstallerpkg "
        ));
        assert!(calls[0].contains("AdobeAuditionCC2014_Uninstall.pkg"));
        assert!(calls[0].ends_with("AdobeAuditionCC2014_Install.pkg"));

        let (failing_dir, _) = stub_munki(&dir.path().join("failing"), 1);
        let failing = MunkiTools::new(&failing_dir, None);
        assert_eq!(import_cc_packages(&failing, &packages, &options).unwrap(), 2);
    }

    #[test]
    fn check_reports_json_from_feed_file() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("aamporter.toml");
        fs::write(
            &config_path,
            "[[products]]\nname = \"PhotoshopCS6\"\nchannels = [\"PhotoshopCS6-13.0\"]\n",
        )
        .unwrap();
        let feed_path = dir.path().join("feed.xml");
        fs::write(&feed_path, "<PhotoshopCS6-13.0,AdobePhotoshop13-mul,13.0.1>\n").unwrap();

        assert!(execute_check(&config_path, false, Some(&feed_path), true).is_ok());
        assert!(execute_check(&config_path, false, Some(&feed_path), false).is_ok());
    }

    #[test]
    fn empty_feed_is_an_error() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("aamporter.toml");
        fs::write(&config_path, "[[products]]\nname = \"A\"\nchannels = [\"C\"]\n").unwrap();
        let feed_path = dir.path().join("feed.xml");
        fs::write(&feed_path, "<?xml version=\"1.0\"?>\n").unwrap();

        let err = execute_check(&config_path, false, Some(&feed_path), false).unwrap_err();
        assert!(matches!(err, AamError::Feed(_)));
    }
}
