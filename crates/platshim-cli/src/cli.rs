use clap::{Parser, Subcommand, ValueEnum};
use platshim_kernel::StubFormat;

#[derive(Parser)]
#[command(
    name = "platshim",
    about = "platshim: platform-conditional module substitution for bundler resolver chains",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a starter platshim.toml and react-native-maps stubs
    Init {
        /// Project directory
        #[arg(default_value = ".")]
        path: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Resolve one import through the substitution chain
    Resolve {
        /// Module specifier as written in the import
        module: String,

        /// Target platform: ios, android, native, or web
        #[arg(long)]
        platform: String,

        /// Path to the rule configuration
        #[arg(long, default_value = "platshim.toml")]
        config: String,

        /// Path of the importing file
        #[arg(long)]
        origin: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Emit the static alias table for one platform
    AliasTable {
        /// Target platform
        #[arg(long, default_value = "web")]
        platform: String,

        /// Path to the rule configuration
        #[arg(long, default_value = "platshim.toml")]
        config: String,

        /// Write the table here instead of stdout
        #[arg(long)]
        out: Option<String>,
    },

    /// Render an inert stub module
    Stub {
        /// Module the stub stands in for
        module: String,

        /// Module format
        #[arg(long, value_enum, default_value_t = StubFormatArg::Cjs)]
        format: StubFormatArg,

        /// Named export to declare (repeatable; `default` is always declared)
        #[arg(long = "export")]
        exports: Vec<String>,

        /// Write the stub here instead of stdout
        #[arg(long)]
        out: Option<String>,
    },

    /// Check replacements and a committed alias table against the rule table
    Check {
        /// Path to the rule configuration
        #[arg(long, default_value = "platshim.toml")]
        config: String,

        /// Committed alias table to compare
        #[arg(long)]
        alias_table: Option<String>,

        /// Platform the alias table targets
        #[arg(long, default_value = "web")]
        platform: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StubFormatArg {
    /// CommonJS (`exports.X = null`)
    Cjs,
    /// ES module (`export const X = null`)
    Esm,
}

impl From<StubFormatArg> for StubFormat {
    fn from(arg: StubFormatArg) -> Self {
        match arg {
            StubFormatArg::Cjs => StubFormat::CommonJs,
            StubFormatArg::Esm => StubFormat::EsModule,
        }
    }
}
