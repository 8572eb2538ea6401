//! The `minget` tool extracts a regular file from a MINIX filesystem image.

use minixfs::Error;
use minixfs::MinixFs;
use minixfs::error;
use minixfs::path;
use std::env::ArgsOs;
use std::ffi::OsString;
use std::fs::OpenOptions;
use std::io;
use std::io::Write;
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
    /// The path of the file to extract, inside the image.
    src: Option<String>,
    /// The destination file; stdout when absent.
    dst: Option<PathBuf>,
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
            _ if res.src.is_none() => res.src = Some(arg.to_str()?.to_owned()),
            _ if res.dst.is_none() => res.dst = Some(arg.into()),
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
    println!(" {bin} [-v] [-p num [-s num]] imagefile srcpath [dstpath]");
    println!();
    println!("Copies a regular file out of a MINIX filesystem image.");
    println!();
    println!("Options:");
    println!(" -h\tPrints help.");
    println!(" -v\tDumps the superblock and the source inode to stderr.");
    println!(" -p num\tSelects a primary partition of the image.");
    println!(" -s num\tSelects a sub-partition of the primary partition.");
    println!(" dstpath\tThe file to write; defaults to stdout.");
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
    let (Some(image), Some(src)) = (args.image, args.src) else {
        print_usage(&bin);
        exit(1);
    };
    let mut fs = MinixFs::open(&image, args.primary, args.sub).unwrap_or_else(|e| {
        error(&bin, format_args!("{}: {e}", image.display()));
    });
    if args.verbose {
        if let Some(entry) = fs.partition() {
            eprintln!("{entry}");
        }
        eprintln!("{}", fs.superblock());
        eprintln!("{}", fs.geometry());
    }
    // Validate the source before the destination is created, so a failed
    // lookup cannot truncate an existing destination file.
    let src = path::canonicalize(&src);
    let inode = fs
        .resolve(&src)
        .and_then(|n| fs.read_inode(n))
        .unwrap_or_else(|e| {
            error(&bin, e);
        });
    if !inode.is_regular() {
        error(&bin, Error::NotARegularFile(src));
    }
    if args.verbose {
        eprintln!("{inode}");
    }
    let result = match args.dst {
        Some(dst) => {
            let mut file = OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(&dst)
                .unwrap_or_else(|e| {
                    error(&bin, format_args!("{}: {e}", dst.display()));
                });
            fs.stream_file(&src, &mut file)
                .and_then(|()| file.flush().map_err(Into::into))
        }
        None => {
            let stdout = io::stdout();
            fs.stream_file(&src, &mut stdout.lock())
        }
    };
    result.unwrap_or_else(|e| {
        error(&bin, e);
    });
}
