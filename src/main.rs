use std::io::Read;
use std::path::PathBuf;
use std::process;

use burial_receipt::{Error, Record, ReceiptOptions, ShortDateFormatter, write_receipt};
use clap::Parser;

#[derive(Parser, Debug)]
#[command(version, about = "Lay out a burial record as an acknowledgement receipt PDF")]
struct Args {
    /// Record as a JSON object; `-` reads standard input
    input: PathBuf,

    /// Directory the receipt is written to
    #[arg(short, long, default_value = ".")]
    out_dir: PathBuf,

    /// Prefix for relative attachment paths
    #[arg(long)]
    base_url: Option<String>,

    /// Installed font family to use instead of Helvetica
    #[arg(long)]
    font: Option<String>,

    /// Currency code printed before amounts
    #[arg(long)]
    currency: Option<String>,

    /// chrono pattern for record dates
    #[arg(long, default_value = burial_receipt::dates::DEFAULT_DATE_PATTERN)]
    date_format: String,
}

fn read_input(input: &PathBuf) -> Result<String, Error> {
    if input.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf).map_err(Error::Io)?;
        Ok(buf)
    } else {
        std::fs::read_to_string(input).map_err(Error::Io)
    }
}

fn run(args: Args) -> Result<PathBuf, Error> {
    let mut options = ReceiptOptions::from_env();
    if let Some(url) = args.base_url {
        options.base_url = url;
    }
    if let Some(font) = args.font {
        options.font_family = Some(font);
    }
    if let Some(currency) = args.currency {
        options.currency = currency;
    }

    let record = Record::from_json(&read_input(&args.input)?)?;
    let dates = ShortDateFormatter::new(args.date_format);
    write_receipt(&record, &dates, &options, &args.out_dir)
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    match run(args) {
        Ok(path) => println!("{}", path.display()),
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    }
}
