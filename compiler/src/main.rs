//! The command line renderer for the Tessera Templating Engine.
// Copyright (C) 2024  Frankie Baffa
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

use {
    clap::Parser as ClapParser,
    std::{
        path::{
            Path,
            PathBuf,
        },
        process::exit as pexit,
    },
    tessera_core::{
        Config,
        Context,
        Environment,
        FileSystemLoader,
        Result,
    },
    tracing::debug,
    tracing_subscriber::EnvFilter,
};

const NOTICE: &str = "tessc  Copyright (C) 2024  Frankie Baffa
This program comes with ABSOLUTELY NO WARRANTY.
This is free software, and you are welcome to redistribute it
under the terms of the GNU General Public License, version 3 or later.";

/// Render a Tessera template to stdout.
#[derive(ClapParser, Debug)]
#[command(name = "tessc", version, about)]
struct Options {
    /// A JSON file of engine options.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// A JSON object file of context variables. Prefix with `alias=` to
    /// nest the object under a dotted name. May be repeated.
    #[arg(short = 'x', long, value_name = "[ALIAS=]FILE")]
    context: Vec<String>,

    /// Fail on undefined names instead of rendering nothing.
    #[arg(short, long)]
    strict: bool,

    /// HTML-escape output by default.
    #[arg(short, long)]
    autoescape: bool,

    /// Print the license notice and exit.
    #[arg(short = 'l', long)]
    license_notice: bool,

    /// The template to render.
    #[arg(required_unless_present = "license_notice")]
    template: Option<PathBuf>,
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn read_context(sources: &[String]) -> Result<std::rc::Rc<Context>> {
    let ctx = Context::new();
    for source in sources {
        match source.split_once('=') {
            Some((alias, path)) => {
                debug!(alias, path, "reading context");
                ctx.read_in_as(path, alias)?;
            },
            None => {
                debug!(path = source.as_str(), "reading context");
                ctx.read_in(source)?;
            },
        }
    }
    Ok(ctx)
}

fn run(opts: Options, template: &Path) -> Result<String> {
    let mut config = match &opts.config {
        Some(path) => Config::read(path)?,
        None => Config::default(),
    };
    config.strict_undefined |= opts.strict;
    config.auto_escape |= opts.autoescape;

    let root = match template.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let name = template.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let env = Environment::new(config, FileSystemLoader::new(root))?;
    let ctx = read_context(&opts.context)?;
    env.render(&name, &ctx)
}

fn main() {
    let opts = Options::parse();

    if opts.license_notice {
        println!("{NOTICE}");
        pexit(0);
    }

    init_logging();

    let template = match &opts.template {
        Some(t) => t.clone(),
        None => {
            eprintln!("Template must be defined.");
            pexit(1);
        },
    };

    match run(opts, &template) {
        Ok(output) => print!("{output}"),
        Err(e) => {
            eprintln!("{e}");
            pexit(1);
        },
    }
}
