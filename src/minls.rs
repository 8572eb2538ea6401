//! The `minls` tool lists a directory held on a MINIX filesystem image.

use minixfs::MinixFs;
use minixfs::error;
use std::env::ArgsOs;
use std::ffi::OsString;
use std::io;
use std::path::PathBuf;
use std::process::exit;

/// Structure storing command line arguments.
#[derive(Default)]
struct Args {
    /// If true, print command line help.
    help: bool,
    /// If true, dump decoded structures to stderr.
    verbose: bool,
    /// The selected primary partition.
    primary: Option<u32>,
    /// The selected sub-partition.
    sub: Option<u32>,
    /// The path to the image file.
    image: Option<PathBuf>,
    /// The path to list, inside the image.
    path: Option<String>,
}

/// Parses a partition number given as the value of `-p` or `-s`.
fn parse_number(arg: Option<OsString>) -> Option<u32> {
    arg?.to_str()?.parse().ok()
}

fn parse_args(args: ArgsOs) -> Option<Args> {
    let mut res: Args = Default::default();
    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.to_str() {
            Some("-h") => res.help = true,
            Some("-v") => res.verbose = true,
            Some("-p") => res.primary = Some(parse_number(iter.next())?),
            Some("-s") => res.sub = Some(parse_number(iter.next())?),
            Some(opt) if opt.starts_with('-') && opt.len() > 1 => return None,
            _ if res.image.is_none() => res.image = Some(arg.into()),
            _ if res.path.is_none() => res.path = Some(arg.to_str()?.to_owned()),
            _ => return None,
        }
    }
    // A sub-partition can only be selected inside a primary partition.
    if res.sub.is_some() && res.primary.is_none() {
        return None;
    }
    Some(res)
}

/// Prints command usage.
///
/// `bin` is the name of the current binary.
fn print_usage(bin: &str) {
    eprintln!("{bin}: bad usage");
    eprintln!("Try '{bin} -h' for more information.");
}

/// Prints command help.
///
/// `bin` is the name of the current binary.
fn print_help(bin: &str) {
    println!();
    println!("Usage:");
    println!(" {bin} [-v] [-p num [-s num]] imagefile [path]");
    println!();
    println!("Lists the contents of a directory on a MINIX filesystem image.");
    println!();
    println!("Options:");
    println!(" -h\tPrints help.");
    println!(" -v\tDumps the superblock and the target inode to stderr.");
    println!(" -p num\tSelects a primary partition of the image.");
    println!(" -s num\tSelects a sub-partition of the primary partition.");
    println!(" path\tThe directory to list; defaults to `/`.");
}

fn main() {
    let (bin, args) = minixfs::args();
    let Some(args) = parse_args(args) else {
        print_usage(&bin);
        exit(1);
    };
    if args.help {
        print_help(&bin);
        return;
    }
    let Some(image) = args.image else {
        print_usage(&bin);
        exit(1);
    };
    let mut fs = MinixFs::open(&image, args.primary, args.sub).unwrap_or_else(|e| {
        error(&bin, format_args!("{}: {e}", image.display()));
    });
    let path = args.path.as_deref().unwrap_or("/");
    if args.verbose {
        if let Some(entry) = fs.partition() {
            eprintln!("{entry}");
        }
        eprintln!("{}", fs.superblock());
        eprintln!("{}", fs.geometry());
        if let Ok(n) = fs.resolve(path)
            && let Ok(inode) = fs.read_inode(n)
        {
            eprintln!("{inode}");
        }
    }
    let stdout = io::stdout();
    fs.list_directory(path, &mut stdout.lock())
        .unwrap_or_else(|e| {
            error(&bin, e);
        });
}
