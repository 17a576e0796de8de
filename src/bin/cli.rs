//! `bcf` command line interface.

use std::process;

use clap::{
    crate_authors, crate_description, crate_name, crate_version, App, AppSettings::*, Arg,
    ArgMatches, SubCommand,
};
use console::style;
use log::{debug, trace, LevelFilter};
use simplelog::*;

use bcf::{self as bc, DeviceCatalog, DeviceSelector, FirmwareCache, Settings, TermPrompt};

fn main() {
    ctrlc::set_handler(move || {
        eprintln!("🛑 received Ctrl+C!");
        process::exit(130);
    })
    .expect("Failed to install my Ctrl-C handler!");

    let links = Arg::with_name("LINKS")
        .help("also list symlinked aliases of devices")
        .long_help(
            "also list the symlinks pointing at serial devices, found in /dev \
             itself and in /dev/serial/by-id and /dev/serial/by-path; ignored \
             on platforms without a /dev tree.",
        )
        .short("l")
        .long("links");

    let matches = App::new(crate_name!())
        .version(format!("v{}", crate_version!()).as_str())
        .author(crate_authors!())
        .about(crate_description!())
        .max_term_width(80)
        .setting(ColoredHelp)
        .setting(NextLineHelp)
        .setting(SubcommandRequiredElseHelp)
        .arg(
            Arg::with_name("CACHE_DIR")
                .help("directory where downloaded firmware is kept")
                .long_help(
                    "directory where downloaded firmware is kept; defaults to \
                     `bcf` under the user cache directory of the platform.",
                )
                .long("cache-dir")
                .env("BCF_CACHE_DIR")
                .takes_value(true)
                .require_equals(true),
        )
        .arg(Arg::with_name("v").short("v").multiple(true).help(
            "Sets the logging level of verbosity, repeat several times for \
                higher verbosity",
        ))
        .subcommand(
            SubCommand::with_name("devices")
                .about("list the connected serial devices")
                .arg(links.clone()),
        )
        .subcommand(
            SubCommand::with_name("select")
                .about("pick a serial device and print its path")
                .long_about(
                    "\n\
                    Prints the path of the serial device to use. When no \
                    device is given, the connected devices are listed on \
                    stderr with their index and the device is chosen by \
                    typing either its path or its index.",
                )
                .arg(
                    Arg::with_name("DEVICE")
                        .help("the serial device to use, skips the selection")
                        .short("d")
                        .long("device")
                        .takes_value(true)
                        .require_equals(true),
                )
                .arg(links),
        )
        .subcommand(
            SubCommand::with_name("fetch")
                .about("download a firmware image into the cache and print its path")
                .arg(
                    Arg::with_name("URL")
                        .help("where to download the firmware from")
                        .required(true)
                        .index(1),
                )
                .arg(
                    Arg::with_name("NO_CACHE")
                        .help("download again even when the firmware is cached")
                        .long("no-cache"),
                )
                .arg(
                    Arg::with_name("SHA256")
                        .help("expected SHA-256 of the firmware, hex encoded")
                        .long("sha256")
                        .takes_value(true)
                        .require_equals(true),
                ),
        )
        .subcommand(
            SubCommand::with_name("cache")
                .about("manage the firmware cache")
                .setting(SubcommandRequiredElseHelp)
                .subcommand(SubCommand::with_name("path").about("print the cache directory"))
                .subcommand(SubCommand::with_name("list").about("list the cached firmware"))
                .subcommand(SubCommand::with_name("clean").about("remove all cached firmware")),
        )
        .get_matches();

    // Vary the output based on how many times the user used the "verbose" flag
    // (i.e. 'bcf -v -v -v' or 'bcf -vvv' vs 'bcf -v'
    let log_level = match matches.occurrences_of("v") {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };

    // Logs go to stderr, stdout is kept for the paths printed by the commands.
    TermLogger::init(
        log_level,
        Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )
    .unwrap();

    trace!("{:#?}", matches);

    let mut builder = bc::SettingsBuilder::new();
    if let Some(dir) = matches.value_of("CACHE_DIR") {
        builder = builder.cache_dir(dir);
    }

    let result = match matches.subcommand() {
        ("devices", Some(sub)) => list_devices(builder, sub),
        ("select", Some(sub)) => select_device(builder, sub),
        ("fetch", Some(sub)) => fetch_firmware(builder, sub),
        ("cache", Some(sub)) => manage_cache(builder.finalize(), sub),
        _ => unreachable!(),
    };

    if let Err(err) = result {
        debug!("{:?}", err);
        match err.download_problem() {
            Some(line) => eprintln!("{}", line),
            None => eprintln!("{}: {}", style("error").red(), err),
        }
        process::exit(1);
    }
}

fn list_devices(builder: bc::SettingsBuilder, args: &ArgMatches) -> bc::Result<()> {
    let settings = builder.include_aliases(args.is_present("LINKS")).finalize();
    let devices = DeviceCatalog::system().list_devices(settings.include_aliases)?;
    let rows: Vec<Vec<&str>> = devices
        .iter()
        .map(|d| vec![d.path.as_str(), d.description.as_str(), d.hardware_id.as_str()])
        .collect();
    bc::print_table(&["Device", "Description", "Hardware ID"], &rows)
}

fn select_device(mut builder: bc::SettingsBuilder, args: &ArgMatches) -> bc::Result<()> {
    if let Some(device) = args.value_of("DEVICE") {
        builder = builder.device(device);
    }
    let settings = builder.include_aliases(args.is_present("LINKS")).finalize();

    let catalog = DeviceCatalog::system();
    let path = DeviceSelector::new(&catalog, TermPrompt::default())
        .include_aliases(settings.include_aliases)
        .resolve(settings.device.as_deref())?;
    println!("{}", path);
    Ok(())
}

fn fetch_firmware(mut builder: bc::SettingsBuilder, args: &ArgMatches) -> bc::Result<()> {
    // URL is required, clap refuses to get here without it.
    let url = args.value_of("URL").unwrap();
    if let Some(checksum) = args.value_of("SHA256") {
        builder = builder.checksum(checksum);
    }
    let settings = builder.use_cache(!args.is_present("NO_CACHE")).finalize();

    let cache = FirmwareCache::from_settings(&settings)?;
    let path = cache.resolve(url, settings.use_cache)?;
    println!("{}", path.display());
    Ok(())
}

fn manage_cache(settings: Settings, args: &ArgMatches) -> bc::Result<()> {
    let cache = FirmwareCache::from_settings(&settings)?;
    match args.subcommand_name() {
        Some("path") => println!("{}", cache.root().display()),
        Some("list") => {
            let rows: Vec<Vec<String>> = cache
                .entries()?
                .into_iter()
                .map(|(name, size)| vec![name, size.to_string()])
                .collect();
            bc::print_table(&["File", "Size"], &rows)?;
        }
        Some("clean") => {
            let removed = cache.clean()?;
            eprintln!("Removed {} file(s) from {}", removed, cache.root().display());
        }
        _ => unreachable!(),
    }
    Ok(())
}
