//! Console rendering for resolution results.
//!
//! Renders the resolved-package table, conflicts, applied resolutions,
//! warnings and the dependency tree with consistent formatting.

pub mod colors;

use wheelhouse_core::ResolutionResult;

use colors::ColorSupport;

/// Output handler for consistent terminal formatting
pub struct OutputHandler {
    colors: ColorSupport,
    quiet: bool,
}

impl OutputHandler {
    /// Create a handler; `quiet` suppresses everything except errors
    pub fn new(quiet: bool) -> Self {
        Self {
            colors: ColorSupport::detect(),
            quiet,
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        if !self.quiet {
            println!("{} {}", self.colors.green("✓"), message);
        }
    }

    /// Print a warning message
    pub fn warn(&self, message: &str) {
        if !self.quiet {
            println!("{} {}", self.colors.yellow("⚠"), message);
        }
    }

    /// Print an error message
    pub fn error(&self, message: &str) {
        eprintln!("{} {}", self.colors.red("✗"), message);
    }

    fn line(&self, message: &str) {
        if !self.quiet {
            println!("{message}");
        }
    }

    /// Render a full resolution report
    pub fn render_result(&self, result: &ResolutionResult) {
        if self.quiet {
            return;
        }

        self.render_packages(result);
        self.render_conflicts(result);
        self.render_resolutions(result);
        self.render_warnings(result);
        self.render_tree(result);

        self.line("");
        if result.success {
            self.success(&format!(
                "Resolved {} package(s) successfully",
                result.packages.len()
            ));
        } else {
            self.error(&format!(
                "Resolution finished with {} unresolved conflict(s)",
                result.conflicts.len()
            ));
        }
    }

    fn render_packages(&self, result: &ResolutionResult) {
        if result.packages.is_empty() {
            self.line("No packages resolved.");
            return;
        }

        self.line(&self.colors.bold("Resolved packages"));
        let name_width = result
            .packages
            .iter()
            .map(|p| p.name.len())
            .max()
            .unwrap_or(0)
            .max("PACKAGE".len());
        let version_width = result
            .packages
            .iter()
            .map(|p| p.version.len())
            .max()
            .unwrap_or(0)
            .max("VERSION".len());

        self.line(&self.colors.dim(&format!(
            "  {:<name_width$}  {:<version_width$}  SOURCE",
            "PACKAGE", "VERSION"
        )));
        for package in &result.packages {
            let source = if package.direct { "direct" } else { "transitive" };
            self.line(&format!(
                "  {:<name_width$}  {:<version_width$}  {}",
                package.name,
                self.colors.cyan(&package.version),
                self.colors.dim(source),
            ));
        }
    }

    fn render_conflicts(&self, result: &ResolutionResult) {
        if result.conflicts.is_empty() {
            return;
        }

        self.line("");
        self.line(&self.colors.bold("Conflicts"));
        for conflict in &result.conflicts {
            self.line(&format!(
                "  {} {} [{}]",
                self.colors.red("•"),
                conflict.reason,
                conflict.severity
            ));
            if !conflict.affected_packages.is_empty() {
                self.line(&self.colors.dim(&format!(
                    "    required by: {}",
                    conflict.affected_packages.join(", ")
                )));
            }
            for suggestion in &conflict.resolution_suggestions {
                self.line(&self.colors.dim(&format!("    - {suggestion}")));
            }
        }
    }

    fn render_resolutions(&self, result: &ResolutionResult) {
        if result.resolutions.is_empty() {
            return;
        }

        self.line("");
        self.line(&self.colors.bold("Applied resolutions"));
        for resolution in &result.resolutions {
            self.line(&format!(
                "  {} {} -> {} ({})",
                self.colors.green("•"),
                resolution.package_name,
                self.colors.cyan(&resolution.chosen_version),
                resolution.reason
            ));
        }
    }

    fn render_warnings(&self, result: &ResolutionResult) {
        if result.warnings.is_empty() {
            return;
        }

        self.line("");
        self.line(&self.colors.bold("Warnings"));
        for warning in &result.warnings {
            self.warn(warning);
        }
    }

    fn render_tree(&self, result: &ResolutionResult) {
        if result.dependency_tree.is_empty() {
            return;
        }

        self.line("");
        self.line(&self.colors.bold("Dependency tree"));
        for (name, dependencies) in &result.dependency_tree {
            if dependencies.is_empty() {
                self.line(&format!("  {name}"));
            } else {
                self.line(&format!(
                    "  {name} -> {}",
                    self.colors.dim(&dependencies.join(", "))
                ));
            }
        }
    }
}
