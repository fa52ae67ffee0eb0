use clap::{Parser, Subcommand};
use deviceframe::{
    CacheDirs, Catalog, CompositeOptions, ContentSource, FrameEvent, Framer,
};
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

#[derive(Parser)]
#[command(name = "deviceframe")]
#[command(about = "Composite screenshots and images into device frames")]
#[command(long_about = "\
Composite screenshots and images into device frames

Takes a local image, an image URL, a web page URL, or stdin, and places it
inside a device frame (phone bezel, laptop lid), writing a single PNG.
Web pages are screenshotted through a locally-installed Chrome/Chromium at
the device's logical viewport size.

Frame artwork is read from the frame cache directory; point --cache-dir at
a directory populated by your frame downloader.")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List known device identifiers
    Devices,
    /// List frames, optionally filtered by device
    Frames {
        /// Only show frames for this device
        #[arg(long)]
        device: Option<String>,
    },
    /// Frame an image, URL, or stdin ("-") into a device frame
    Frame {
        /// Image file, image/page URL, or "-" for stdin
        input: String,
        /// Frame or device name (see `deviceframe frames`)
        #[arg(long = "frame", value_name = "NAME")]
        frame: String,
        /// Output PNG path
        #[arg(short, long, default_value = "framed.png")]
        output: PathBuf,
        /// Seconds to wait after page load before capturing
        #[arg(long, default_value_t = 0.0)]
        delay: f64,
        /// Cache root holding frame artwork (defaults to the platform cache)
        #[arg(long)]
        cache_dir: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run(Cli::parse()).await {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let catalog = Catalog::builtin()?;

    match cli.command {
        Command::Devices => {
            for device in catalog.devices() {
                println!("{device}");
            }
        }
        Command::Frames { device } => {
            for frame in catalog.frames() {
                if let Some(filter) = &device
                    && !frame.device.eq_ignore_ascii_case(filter)
                {
                    continue;
                }
                println!(
                    "{}\t{} ({}x{})",
                    frame.name, frame.device, frame.frame.width, frame.frame.height
                );
            }
        }
        Command::Frame {
            input,
            frame,
            output,
            delay,
            cache_dir,
        } => {
            let descriptor = catalog
                .find(&frame)
                .ok_or_else(|| format!("unknown frame or device: {frame}"))?
                .clone();

            let cache = match cache_dir {
                Some(root) => CacheDirs::under(root),
                None => CacheDirs::default_location()
                    .ok_or("no platform cache directory; pass --cache-dir")?,
            };
            let framer = Framer::new(cache)?;

            if !delay.is_finite() || delay < 0.0 {
                return Err(format!("invalid delay: {delay}").into());
            }

            let content = parse_input(&input).await?;
            let options = CompositeOptions {
                delay: Duration::from_secs_f64(delay),
            };

            let mut stream = framer.composite_stream(content, descriptor, options);
            while let Some(event) = stream.next_event().await {
                match event {
                    FrameEvent::Debug(msg) => eprintln!("> {msg}"),
                    FrameEvent::Error(err) => return Err(err.into()),
                    FrameEvent::End(buffer) => {
                        tokio::fs::write(&output, &buffer).await?;
                        println!("{}", output.display());
                    }
                }
            }
        }
    }

    Ok(())
}

/// Classify the input argument: stdin, URL, or local file.
async fn parse_input(input: &str) -> Result<ContentSource, std::io::Error> {
    if input == "-" {
        return Ok(ContentSource::stream(tokio::io::stdin()));
    }
    if let Ok(url) = Url::parse(input)
        && matches!(url.scheme(), "http" | "https")
    {
        return Ok(ContentSource::from(url));
    }
    tokio::fs::read(input).await.map(ContentSource::from)
}
