mod seed;
mod snapshot;


use std::fs::File;
use std::io::{self, BufWriter};
use std::path::PathBuf;
use std::rc::Rc;

use clap::{Args, Parser, Subcommand};
use pixelboard::consts::{DEFAULT_GRID_HEIGHT, DEFAULT_GRID_WIDTH, MAX_GRID_DIM, PALETTE};
use pixelboard::grid::{Rgb, UserId};
use pixelboard::net::config::{DEFAULT_PIXELS_TABLE, StoreConfig};
use pixelboard::net::identity::StaticIdentity;
use pixelboard::net::rest::RestPixelTable;
use pixelboard::net::store::{PixelTable, StoreError};
use pixelboard::net::types::PixelRow;
use pixelboard::net::users::{HttpUserDirectory, LookupError, UserDirectory};
use pixelboard::transform::{Cell, GridDims, is_in_bounds};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::snapshot::Board;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("missing {flag}; pass --{flag} or set {var}")]
    MissingSetting { flag: &'static str, var: &'static str },
    #[error("cell ({x}, {y}) is outside the {width}x{height} grid")]
    OutOfBounds { x: i32, y: i32, width: u32, height: u32 },
    #[error("file access failed: {0}")]
    Io(#[from] io::Error),
    #[error("image processing failed: {0}")]
    Image(#[from] image::ImageError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Lookup(#[from] LookupError),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "pixelboard", about = "Pixel canvas operator CLI")]
struct Cli {
    #[arg(long, env = "PIXELBOARD_STORE_URL")]
    store_url: Option<String>,

    #[arg(long, env = "PIXELBOARD_STORE_KEY", hide_env_values = true)]
    store_key: Option<String>,

    #[arg(long, env = "PIXELBOARD_USERS_URL")]
    users_url: Option<String>,

    #[arg(long, env = "PIXELBOARD_PIXELS_TABLE", default_value = DEFAULT_PIXELS_TABLE)]
    pixels_table: String,

    #[arg(long, env = "PIXELBOARD_GRID_WIDTH", default_value_t = DEFAULT_GRID_WIDTH, value_parser = clap::value_parser!(u32).range(1..=i64::from(MAX_GRID_DIM)))]
    grid_width: u32,

    #[arg(long, env = "PIXELBOARD_GRID_HEIGHT", default_value_t = DEFAULT_GRID_HEIGHT, value_parser = clap::value_parser!(u32).range(1..=i64::from(MAX_GRID_DIM)))]
    grid_height: u32,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone)]
struct CliContext {
    store_url: Option<String>,
    store_key: Option<String>,
    users_url: Option<String>,
    pixels_table: String,
    dims: GridDims,
}

impl CliContext {
    fn store_config(&self) -> Result<StoreConfig, CliError> {
        let store_url = self
            .store_url
            .clone()
            .ok_or(CliError::MissingSetting { flag: "store-url", var: "PIXELBOARD_STORE_URL" })?;
        let store_key = self
            .store_key
            .clone()
            .ok_or(CliError::MissingSetting { flag: "store-key", var: "PIXELBOARD_STORE_KEY" })?;
        let mut config = StoreConfig::new(store_url, store_key, self.users_url.clone().unwrap_or_default());
        config.pixels_table.clone_from(&self.pixels_table);
        Ok(config)
    }

    fn users_config(&self) -> Result<StoreConfig, CliError> {
        let users_url = self
            .users_url
            .clone()
            .ok_or(CliError::MissingSetting { flag: "users-url", var: "PIXELBOARD_USERS_URL" })?;
        Ok(StoreConfig::new(
            self.store_url.clone().unwrap_or_default(),
            self.store_key.clone().unwrap_or_default(),
            users_url,
        ))
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert an image into palette rows for the pixels table.
    Seed(SeedArgs),
    /// Fetch the whole table.
    Snapshot(SnapshotArgs),
    /// Upsert a single pixel.
    Place(PlaceArgs),
    /// Resolve a placer id to a username.
    Whois { user_id: String },
}

#[derive(Args, Debug)]
struct SeedArgs {
    image: PathBuf,

    #[arg(long, default_value = seed::DEFAULT_OUTPUT, help = "CSV output path, or - for stdout")]
    output: String,

    #[arg(long, default_value = seed::DEFAULT_PLACED_BY)]
    placed_by: String,

    #[arg(long, default_value_t = false, help = "Upsert the rows into the store instead of writing CSV")]
    upload: bool,
}

#[derive(Args, Debug)]
struct SnapshotArgs {
    #[arg(long, help = "Write a PNG with one pixel per cell")]
    png: Option<PathBuf>,

    #[arg(long, default_value_t = false, help = "Print the raw rows as JSON")]
    json: bool,
}

#[derive(Args, Debug)]
struct PlaceArgs {
    x: i32,
    y: i32,

    #[arg(long, value_parser = parse_rgb, help = "Colour as r,g,b")]
    color: Rgb,

    #[arg(long)]
    user: String,

    #[arg(long, env = "PIXELBOARD_ACCESS_TOKEN", hide_env_values = true)]
    token: Option<String>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let ctx = CliContext {
        store_url: cli.store_url,
        store_key: cli.store_key,
        users_url: cli.users_url,
        pixels_table: cli.pixels_table,
        dims: GridDims::new(cli.grid_width, cli.grid_height),
    };

    match cli.command {
        Command::Seed(args) => run_seed(&ctx, args).await,
        Command::Snapshot(args) => run_snapshot(&ctx, args).await,
        Command::Place(args) => run_place(&ctx, args).await,
        Command::Whois { user_id } => run_whois(&ctx, &user_id).await,
    }
}

async fn run_seed(cli: &CliContext, args: SeedArgs) -> Result<(), CliError> {
    let source = image::open(&args.image)?;
    let rows = seed::palette_rows(&source, cli.dims, &UserId::new(args.placed_by));
    info!(rows = rows.len(), width = cli.dims.width, height = cli.dims.height, "image converted");

    if args.upload {
        let table = RestPixelTable::new(cli.store_config()?)?;
        for (index, row) in rows.iter().enumerate() {
            table.upsert(row).await?;
            if (index + 1) % 1000 == 0 {
                info!(uploaded = index + 1, "seed upload progress");
            }
        }
        info!(rows = rows.len(), "seed upload complete");
        return Ok(());
    }

    if args.output == "-" {
        seed::write_csv(&rows, io::stdout().lock())?;
    } else {
        seed::write_csv(&rows, BufWriter::new(File::create(&args.output)?))?;
        println!("wrote {} rows to {}", rows.len(), args.output);
    }
    Ok(())
}

async fn run_snapshot(cli: &CliContext, args: SnapshotArgs) -> Result<(), CliError> {
    let table = RestPixelTable::new(cli.store_config()?)?;
    let rows = table.select_all().await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    let board = Board::from_rows(&rows, cli.dims);
    if board.skipped > 0 {
        warn!(skipped = board.skipped, "rows outside the grid ignored");
    }
    match args.png {
        Some(path) => {
            board.write_png(&path)?;
            println!("wrote {}x{} snapshot to {}", cli.dims.width, cli.dims.height, path.display());
        }
        None => print!("{}", board.summary()),
    }
    Ok(())
}

async fn run_place(cli: &CliContext, args: PlaceArgs) -> Result<(), CliError> {
    let cell = Cell::new(args.x, args.y);
    if !is_in_bounds(cell, cli.dims) {
        return Err(CliError::OutOfBounds { x: args.x, y: args.y, width: cli.dims.width, height: cli.dims.height });
    }
    if !PALETTE.contains(&args.color) {
        warn!(color = %args.color.to_css(), "colour is not in the palette");
    }

    let user = UserId::new(args.user);
    let mut table = RestPixelTable::new(cli.store_config()?)?;
    if let Some(token) = args.token {
        table = table.with_identity(Rc::new(StaticIdentity::signed_in(user.clone()).with_token(token)));
    }
    let row = PixelRow {
        x: args.x,
        y: args.y,
        r: args.color.r,
        g: args.color.g,
        b: args.color.b,
        placed_by: Some(user),
    };
    table.upsert(&row).await?;
    println!("placed {} at ({}, {})", args.color.to_css(), args.x, args.y);
    Ok(())
}

async fn run_whois(cli: &CliContext, user_id: &str) -> Result<(), CliError> {
    let directory = HttpUserDirectory::new(cli.users_config()?)?;
    match directory.username(&UserId::new(user_id)).await? {
        Some(name) => println!("{name}"),
        None => println!("unknown user {user_id}"),
    }
    Ok(())
}

/// Parse `r,g,b` (decimal) or `#rrggbb`.
fn parse_rgb(value: &str) -> Result<Rgb, String> {
    let value = value.trim();
    if let Some(hex) = value.strip_prefix('#') {
        let channel = |range: std::ops::Range<usize>| {
            hex.get(range).and_then(|digits| u8::from_str_radix(digits, 16).ok())
        };
        return match (hex.len(), channel(0..2), channel(2..4), channel(4..6)) {
            (6, Some(r), Some(g), Some(b)) => Ok(Rgb::new(r, g, b)),
            _ => Err(format!("invalid hex colour `{value}`")),
        };
    }
    let channels: Vec<&str> = value.split(',').map(str::trim).collect();
    let [r, g, b] = channels.as_slice() else {
        return Err(format!("expected r,g,b, got `{value}`"));
    };
    let parse = |channel: &str| channel.parse::<u8>().map_err(|e| format!("invalid channel `{channel}`: {e}"));
    Ok(Rgb::new(parse(r)?, parse(g)?, parse(b)?))
}
