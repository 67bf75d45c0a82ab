use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "penmark", version)]
#[command(
    about = "Build search, stats, and preview-image artifacts for a Markdown site",
    long_about = "penmark turns a folder of Markdown articles into publishable artifacts: \n\
HTML fragments with embedded social cards, a client-side search index, writing \n\
statistics, and Open Graph preview images for every article."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    pub fn build() -> Self {
        <Self as Parser>::parse()
    }
}

#[derive(Subcommand, Clone, Debug)]
pub enum Command {
    #[command(
        about = "Create the starter directories, config, and a sample article",
        long_about = "Initialise a new penmark workspace.\n\
The command is idempotent: existing files are left untouched, so you can rerun it\n\
to restore missing folders without overwriting customisations."
    )]
    Init(InitArgs),
    #[command(
        about = "Build every artifact into the dist/ output tree",
        long_about = "Render article HTML, the search index, the stats file, and OG preview images.\n\
Preview images whose inputs did not change since the last build are kept as they are\n\
unless --force is given. Any error aborts the build before artifacts are written."
    )]
    Build(BuildArgs),
    #[command(
        about = "Serve the dist/ directory over HTTP",
        long_about = "Serve the generated dist/ directory locally with the same caching headers\n\
the artifacts are meant to be deployed with. Run `penmark build` first."
    )]
    Serve(ServeArgs),
    #[command(
        about = "Remove dist/ and the preview image cache",
        long_about = "Delete the previously built dist/ directory and the cache stored in .penmark.\n\
The next build renders every preview image again.",
        alias = "clear"
    )]
    Clean(CleanArgs),
    #[command(
        about = "Query configuration values from penmark.yaml",
        long_about = "Read configuration values from penmark.yaml or get the project root path.\n\
Use this command from any subdirectory within the project to retrieve config values."
    )]
    Config(ConfigArgs),
}

#[derive(Args, Clone, Debug)]
pub struct InitArgs {
    #[arg(
        long,
        help = "Project root directory (defaults to current directory)",
        long_help = "Specify the project root directory. Supports tilde expansion (e.g., ~/mysite). If not provided, uses the current working directory."
    )]
    pub root: Option<String>,
}

#[derive(Args, Clone, Debug)]
pub struct BuildArgs {
    #[arg(
        long,
        help = "Project root directory (defaults to the nearest penmark.yaml)",
        long_help = "Specify the project root directory. Supports tilde expansion (e.g., ~/mysite). If not provided, penmark walks up from the current directory looking for penmark.yaml."
    )]
    pub root: Option<String>,
    #[arg(
        long,
        help = "Include draft articles in every artifact",
        long_help = "Publish articles marked `draft: true`. The same switch can be turned on with PENMARK_INCLUDE_DRAFTS=1 or `include_drafts: true` in penmark.yaml."
    )]
    pub drafts: bool,
    #[arg(
        long,
        help = "Ignore the preview image cache and render every image",
        long_help = "Disables the cache shortcut and regenerates every OG preview image. Use this after replacing the font files."
    )]
    pub force: bool,
    #[arg(
        short,
        long,
        help = "Print progress information while building",
        long_help = "Show each pipeline stage, article counts, and which preview images are rendered or kept."
    )]
    pub verbose: bool,
}

#[derive(Args, Clone, Debug)]
pub struct ServeArgs {
    #[arg(
        long,
        help = "Project root directory (defaults to the nearest penmark.yaml)",
        long_help = "Specify the project root directory. Supports tilde expansion (e.g., ~/mysite). If not provided, penmark walks up from the current directory looking for penmark.yaml."
    )]
    pub root: Option<String>,
    #[arg(
        long,
        default_value = "127.0.0.1",
        help = "Interface to bind the server to",
        long_help = "Set an alternate host/IP address for the server. Defaults to 127.0.0.1 so it only listens locally."
    )]
    pub host: String,
    #[arg(
        long,
        default_value_t = 4000,
        help = "Port number for the server",
        long_help = "Pick a custom TCP port for the server. 4000 is the default."
    )]
    pub port: u16,
    #[arg(
        long,
        help = "Log every request",
        long_help = "Print the method, path, and response status of each request."
    )]
    pub verbose: bool,
}

#[derive(Args, Clone, Debug)]
pub struct CleanArgs {
    #[arg(
        long,
        help = "Project root directory (defaults to the nearest penmark.yaml)",
        long_help = "Specify the project root directory. Supports tilde expansion (e.g., ~/mysite). If not provided, penmark walks up from the current directory looking for penmark.yaml."
    )]
    pub root: Option<String>,
}

#[derive(Args, Clone, Debug)]
pub struct ConfigArgs {
    #[arg(
        long,
        help = "Project root directory (defaults to the nearest penmark.yaml)",
        long_help = "Specify the project root directory. Supports tilde expansion (e.g., ~/mysite). If not provided, penmark walks up from the current directory looking for penmark.yaml."
    )]
    pub root: Option<String>,
    #[arg(long = "root-dir", help = "Get the project root directory path")]
    pub root_dir: bool,
    #[arg(long, help = "Get the title configuration value")]
    pub title: bool,
    #[arg(long, help = "Get the base_url configuration value")]
    pub base_url: bool,
    #[arg(long, help = "Get the base_path configuration value")]
    pub base_path: bool,
    #[arg(long, help = "Get the timezone configuration value")]
    pub timezone: bool,
    #[arg(long, help = "Get the date_format configuration value")]
    pub date_format: bool,
    #[arg(long, help = "Get the collections configuration value")]
    pub collections: bool,
    #[arg(long, help = "Get the search.asset_path configuration value")]
    pub search_asset_path: bool,
    #[arg(long, help = "Get the stats.asset_path configuration value")]
    pub stats_asset_path: bool,
    #[arg(long, help = "Get the og.output_dir configuration value")]
    pub og_output_dir: bool,
}
