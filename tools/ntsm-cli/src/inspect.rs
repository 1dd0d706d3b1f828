//! Inspect command - print the structure of an .ntsm file

use anyhow::{Context, Result};
use clap::Args;
use ntsm_format::{DecodeOptions, GLB_MAGIC, NtsmReader, Span, flag_names};
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

/// Arguments for the inspect command
#[derive(Args)]
pub struct InspectArgs {
    /// .ntsm file to inspect
    pub file: PathBuf,

    /// Also print every emitter field
    #[arg(long)]
    pub emitters: bool,
}

/// Execute the inspect command
pub fn execute(args: InspectArgs) -> Result<()> {
    let file = File::open(&args.file)
        .with_context(|| format!("Failed to open {}", args.file.display()))?;
    // The GLB magic is reported below rather than rejected
    let options = DecodeOptions {
        check_glb_magic: false,
    };
    let mut reader = NtsmReader::with_options(BufReader::new(file), options)
        .with_context(|| format!("Invalid NTSM file: {}", args.file.display()))?;

    let header = reader.header().clone();
    let flags = flag_names(header.flags);

    println!("=== {} ===", args.file.display());
    println!("  Name:     {}", header.name);
    println!("  Version:  {}", header.version);
    println!(
        "  Flags:    0x{:02x} ({})",
        header.flags,
        if flags.is_empty() { "none".to_string() } else { flags.join(", ") }
    );
    println!("  Size:     {} bytes", reader.file_len());

    println!();
    println!("Sections:");
    print_span("GLB", header.glb_span());
    if header.has_particles() {
        print_span("Particles", header.particle_span());
    }
    if header.texture_count > 0 {
        print_span("Textures", header.texture_table_span());
    }

    let glb = reader.read_glb()?;
    let glb_ok = glb.get(0..4) == Some(&GLB_MAGIC[..]);
    println!(
        "  GLB magic: {}",
        if glb_ok { "ok" } else { "missing (not a glTF binary)" }
    );

    let emitters = reader.read_emitters()?;
    if !emitters.is_empty() {
        println!();
        println!("Emitters ({}):", emitters.len());
        for (i, e) in emitters.iter().enumerate() {
            let texture = if e.uses_default_texture() {
                "default".to_string()
            } else {
                format!("#{}", e.texture_index)
            };
            println!(
                "  [{i}] pos {:?} rate {}/s life {}s texture {} {}",
                e.position,
                e.emission_rate,
                e.lifetime,
                texture,
                if e.is_looping() { "looping" } else { "once" }
            );
            if args.emitters {
                println!("      {e:?}");
            }
        }
    }

    if !reader.texture_entries().is_empty() {
        println!();
        println!("Textures ({}):", reader.texture_entries().len());
        for (i, entry) in reader.texture_entries().iter().enumerate() {
            println!(
                "  [{i}] {:<24} {:>10} bytes @ {}",
                entry.name, entry.size, entry.offset
            );
        }
    }

    Ok(())
}

fn print_span(label: &str, span: Span) {
    println!(
        "  {:<10} {:>10} .. {:<10} ({} bytes)",
        label,
        span.offset,
        span.end(),
        span.len
    );
}
