use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "lb", about = concat!("laneboard v", env!("CARGO_PKG_VERSION"), " - projects in lanes, cards in projects"), version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Use a different data directory (default: $LB_HOME or ~/.laneboard)
    #[arg(short = 'C', long = "data-dir", global = true)]
    pub data_dir: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the board: lanes, cards, and progress
    Board,
    /// Show one project's cards
    Show(ShowArgs),
    /// List archived projects
    Archived,
    /// Show completion statistics
    Stats,
    /// Search card content
    Search(SearchArgs),
    /// Overdue cards and what is on for today
    Today(DayArgs),
    /// Dated cards grouped by due date
    Schedule(DayArgs),
    /// Project management
    Project(ProjectCmd),
    /// Card management
    Card(CardCmd),
    /// Write a backup file
    Export(ExportArgs),
    /// Replace all data with a backup file
    Import(ImportArgs),
    /// Sign in and pull remote state
    Login(LoginArgs),
    /// Sign out and return to local data
    Logout,
    /// Pull remote state (remote wins)
    Sync,
}

// ---------------------------------------------------------------------------
// Read command args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct ShowArgs {
    /// Project ID (or unique prefix) or exact name
    pub project: String,
}

#[derive(Args)]
pub struct SearchArgs {
    /// Text to look for (case-insensitive)
    pub query: String,
}

#[derive(Args)]
pub struct DayArgs {
    /// Day to use as today (YYYY-MM-DD, default: local date)
    #[arg(long)]
    pub date: Option<String>,
}

// ---------------------------------------------------------------------------
// Projects
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct ProjectCmd {
    #[command(subcommand)]
    pub action: ProjectAction,
}

#[derive(Subcommand)]
pub enum ProjectAction {
    /// Create a project
    New(ProjectNewArgs),
    /// Rename a project
    Rename(ProjectRenameArgs),
    /// Change a project's color
    Color(ProjectColorArgs),
    /// Move a project to the archive
    Archive(ProjectRef),
    /// Bring an archived project back
    Restore(ProjectRef),
    /// Permanently delete a project
    Delete(ProjectDeleteArgs),
    /// Drop a project next to another one
    Move(ProjectMoveArgs),
    /// Focus one project (or clear focus)
    Focus(ProjectFocusArgs),
}

#[derive(Args)]
pub struct ProjectNewArgs {
    /// Project name (at most 30 characters)
    pub name: String,
    /// Hex color (#RGB or #RRGGBB, default: first unused preset)
    #[arg(long)]
    pub color: Option<String>,
}

#[derive(Args)]
pub struct ProjectRef {
    /// Project ID (or unique prefix) or exact name
    pub project: String,
}

#[derive(Args)]
pub struct ProjectRenameArgs {
    /// Project ID (or unique prefix) or exact name
    pub project: String,
    /// New name
    pub name: String,
}

#[derive(Args)]
pub struct ProjectColorArgs {
    /// Project ID (or unique prefix) or exact name
    pub project: String,
    /// New hex color
    pub color: String,
}

#[derive(Args)]
pub struct ProjectDeleteArgs {
    /// Project ID (or unique prefix) or exact name
    pub project: String,
    /// Delete from the archive instead of the active board
    #[arg(long)]
    pub archived: bool,
}

#[derive(Args)]
pub struct ProjectMoveArgs {
    /// Project to move
    pub project: String,
    /// Where to drop it: left, right, top, bottom
    pub position: String,
    /// Project to drop it next to
    pub target: String,
}

#[derive(Args)]
pub struct ProjectFocusArgs {
    /// Project to focus (omit with --clear)
    pub project: Option<String>,
    /// Clear the focus
    #[arg(long)]
    pub clear: bool,
}

// ---------------------------------------------------------------------------
// Cards
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct CardCmd {
    #[command(subcommand)]
    pub action: CardAction,
}

#[derive(Subcommand)]
pub enum CardAction {
    /// Add a card to the top of a project
    Add(CardAddArgs),
    /// Change a card's content, type, or due date
    Edit(CardEditArgs),
    /// Mark a card done, or not done
    Toggle(CardRef),
    /// Delete a card
    Rm(CardRef),
}

#[derive(Args)]
pub struct CardAddArgs {
    /// Project ID (or unique prefix) or exact name
    pub project: String,
    /// Card text (at most 500 characters)
    pub content: String,
    /// Card type: task, note, important
    #[arg(long = "type", default_value = "task")]
    pub card_type: String,
    /// Due date (YYYY-MM-DD); required for important cards
    #[arg(long)]
    pub due: Option<String>,
}

#[derive(Args)]
pub struct CardEditArgs {
    /// Project ID (or unique prefix) or exact name
    pub project: String,
    /// Card ID (or unique prefix)
    pub card: String,
    /// New text
    #[arg(long)]
    pub content: Option<String>,
    /// New type: task, note, important
    #[arg(long = "type")]
    pub card_type: Option<String>,
    /// New due date (YYYY-MM-DD)
    #[arg(long, conflicts_with = "no_due")]
    pub due: Option<String>,
    /// Remove the due date
    #[arg(long)]
    pub no_due: bool,
}

#[derive(Args)]
pub struct CardRef {
    /// Project ID (or unique prefix) or exact name
    pub project: String,
    /// Card ID (or unique prefix)
    pub card: String,
}

// ---------------------------------------------------------------------------
// Backup and identity
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct ExportArgs {
    /// Output file (default: dashboard_backup_<date>.json; "-" for stdout)
    #[arg(short, long)]
    pub output: Option<String>,
}

#[derive(Args)]
pub struct ImportArgs {
    /// Backup file to read
    pub file: String,
}

#[derive(Args)]
pub struct LoginArgs {
    /// User identity
    pub user: String,
}
