use std::path::Path;

use anyhow::{bail, Context};
use colored::Colorize;
use serde_json::json;
use terrace_sdk::{CsvOptions, Layer, LayerId, NamedGraph, Store, StringTriple};
use tracing::{debug, warn};

use crate::cli::*;
use crate::config::CliConfig;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = CliConfig::load(cli.config.as_deref())?;
    let format = cli.format;
    if let Command::Manifest(args) = &cli.command {
        return cmd_manifest(args, format);
    }
    if !matches!(cli.command, Command::Init) && !cli.store.join("layers").is_dir() {
        bail!(
            "no store at {}; run `terrace init` first",
            cli.store.display()
        );
    }
    debug!(store = %cli.store.display(), config = ?config, "opening store");
    let store = Store::open_directory_with_config(&cli.store, config.store)
        .with_context(|| format!("opening store {}", cli.store.display()))?
        .with_pack_config(config.pack);

    match cli.command {
        Command::Init => cmd_init(&cli.store, format),
        Command::CreateGraph(args) => cmd_create_graph(&store, &args, format),
        Command::DeleteGraph(args) => cmd_delete_graph(&store, &args, format),
        Command::Graphs => cmd_graphs(&store, format),
        Command::Head(args) => cmd_head(&store, &args, format),
        Command::Add(args) => cmd_change(&store, &args, true, format),
        Command::Remove(args) => cmd_change(&store, &args, false, format),
        Command::ImportCsv(args) => cmd_import_csv(&store, &args, format),
        Command::Triples(args) => cmd_triples(&store, &args, format),
        Command::Log(args) => cmd_log(&store, &args, format),
        Command::Squash(args) => cmd_squash(&store, &args, format),
        Command::Export(args) => cmd_export(&store, &args, format),
        Command::Import(args) => cmd_import(&store, &args, format),
        Command::Manifest(_) => Ok(()),
    }
}

fn open_graph(store: &Store, name: &str) -> anyhow::Result<NamedGraph> {
    store
        .open_named_graph(name)?
        .with_context(|| format!("no graph named {name}"))
}

fn parse_ids(ids: &[String]) -> anyhow::Result<Vec<LayerId>> {
    ids.iter()
        .map(|s| {
            s.parse::<LayerId>()
                .with_context(|| format!("bad layer id {s}"))
        })
        .collect()
}

fn print_json(value: serde_json::Value) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

fn layer_json(layer: &Layer) -> serde_json::Value {
    json!({
        "id": layer.id().to_hex(),
        "parent": layer.parent_id().map(|p| p.to_hex()),
        "additions": layer.triple_addition_count(),
        "removals": layer.triple_removal_count(),
        "triples": layer.total_triple_count(),
    })
}

fn cmd_init(path: &Path, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => print_json(json!({ "store": path.display().to_string() })),
        OutputFormat::Text => {
            println!(
                "{} Initialized Terrace store in {}",
                "✓".green().bold(),
                path.display().to_string().bold()
            );
            Ok(())
        }
    }
}

fn cmd_create_graph(store: &Store, args: &GraphArgs, format: OutputFormat) -> anyhow::Result<()> {
    store.create_named_graph(&args.graph)?;
    match format {
        OutputFormat::Json => print_json(json!({ "created": args.graph })),
        OutputFormat::Text => {
            println!("Created graph {}", args.graph.yellow());
            Ok(())
        }
    }
}

fn cmd_delete_graph(store: &Store, args: &GraphArgs, format: OutputFormat) -> anyhow::Result<()> {
    if !store.delete_named_graph(&args.graph)? {
        bail!("no graph named {}", args.graph);
    }
    match format {
        OutputFormat::Json => print_json(json!({ "deleted": args.graph })),
        OutputFormat::Text => {
            println!("Deleted graph {}", args.graph.yellow());
            Ok(())
        }
    }
}

fn cmd_graphs(store: &Store, format: OutputFormat) -> anyhow::Result<()> {
    let names = store.named_graphs()?;
    match format {
        OutputFormat::Json => print_json(json!(names)),
        OutputFormat::Text => {
            if names.is_empty() {
                println!("No graphs.");
            }
            for name in names {
                println!("  {}", name.yellow());
            }
            Ok(())
        }
    }
}

fn cmd_head(store: &Store, args: &GraphArgs, format: OutputFormat) -> anyhow::Result<()> {
    let graph = open_graph(store, &args.graph)?;
    let (head, version) = graph.head_version()?;
    match format {
        OutputFormat::Json => print_json(json!({
            "graph": args.graph,
            "version": version,
            "head": head.as_ref().map(layer_json),
        })),
        OutputFormat::Text => {
            match head {
                Some(layer) => println!(
                    "{} {} (version {}, {} triples)",
                    args.graph.yellow().bold(),
                    layer.id().to_hex().cyan(),
                    version,
                    layer.total_triple_count()
                ),
                None => println!("{} has no head (version {version})", args.graph.yellow()),
            }
            Ok(())
        }
    }
}

fn cmd_change(
    store: &Store,
    args: &TripleArgs,
    add: bool,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let triple = if args.node {
        StringTriple::new_node(&args.subject, &args.predicate, &args.object)
    } else {
        StringTriple::new_value(&args.subject, &args.predicate, &args.object)
    };
    let graph = open_graph(store, &args.graph)?;
    let mut builder = graph.open_write()?;
    let changed = if add {
        builder.add_string_triple(triple.clone())?
    } else {
        builder.remove_string_triple(&triple)?
    };
    if !changed {
        return match format {
            OutputFormat::Json => print_json(json!({ "changed": false })),
            OutputFormat::Text => {
                let state = if add { "already present" } else { "not present" };
                println!("{triple}: {state}, nothing to commit");
                Ok(())
            }
        };
    }
    let layer = builder.commit()?;
    if !graph.set_head(&layer)? {
        warn!(graph = %args.graph, layer = %layer.id(), "head moved during commit");
        bail!(
            "graph {} moved while committing; layer {} was stored but is not the head",
            args.graph,
            layer.id()
        );
    }
    match format {
        OutputFormat::Json => print_json(json!({ "changed": true, "layer": layer_json(&layer) })),
        OutputFormat::Text => {
            let verb = if add { "Added".green() } else { "Removed".red() };
            println!("{verb} {triple}");
            println!("  Layer: {}", layer.id().to_hex().cyan());
            Ok(())
        }
    }
}

fn cmd_import_csv(
    store: &Store,
    args: &ImportCsvArgs,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let file = std::fs::File::open(&args.path)
        .with_context(|| format!("opening {}", args.path.display()))?;
    let options = CsvOptions {
        data_prefix: args.data_prefix.clone(),
        predicate_prefix: args.predicate_prefix.clone(),
        has_header: !args.no_header,
        skip_header: args.skip_header,
    };
    let graph = open_graph(store, &args.graph)?;
    let mut builder = graph.open_write()?;
    let rows = builder
        .import_csv(std::io::BufReader::new(file), &options)
        .with_context(|| format!("reading {}", args.path.display()))?;
    let layer = builder.commit()?;
    if !graph.set_head(&layer)? {
        warn!(graph = %args.graph, layer = %layer.id(), "head moved during import");
        bail!(
            "graph {} moved while importing; layer {} was stored but is not the head",
            args.graph,
            layer.id()
        );
    }
    match format {
        OutputFormat::Json => print_json(json!({ "rows": rows, "layer": layer_json(&layer) })),
        OutputFormat::Text => {
            println!(
                "{} Imported {} rows from {}",
                "✓".green().bold(),
                rows,
                args.path.display()
            );
            println!("  Layer: {}", layer.id().to_hex().cyan());
            Ok(())
        }
    }
}

fn cmd_triples(store: &Store, args: &TriplesArgs, format: OutputFormat) -> anyhow::Result<()> {
    let layer = match (&args.layer, &args.graph) {
        (Some(id), _) => store
            .get_layer_by_hex(id)?
            .with_context(|| format!("no layer {id}"))?,
        (None, Some(name)) => match open_graph(store, name)?.head()? {
            Some(head) => head,
            None => {
                return match format {
                    OutputFormat::Json => print_json(json!([])),
                    OutputFormat::Text => Ok(()),
                }
            }
        },
        (None, None) => bail!("either a graph or --layer is required"),
    };
    let triples: Vec<StringTriple> = layer.string_triples().collect();
    match format {
        OutputFormat::Json => print_json(serde_json::to_value(&triples)?),
        OutputFormat::Text => {
            for t in &triples {
                println!("{t}");
            }
            Ok(())
        }
    }
}

fn cmd_log(store: &Store, args: &LogArgs, format: OutputFormat) -> anyhow::Result<()> {
    let graph = open_graph(store, &args.graph)?;
    let Some(head) = graph.head()? else {
        return match format {
            OutputFormat::Json => print_json(json!([])),
            OutputFormat::Text => {
                println!("{} has no layers.", args.graph.yellow());
                Ok(())
            }
        };
    };
    let layers: Vec<&Layer> = head.chain().take(args.limit).collect();
    match format {
        OutputFormat::Json => print_json(json!(layers
            .iter()
            .map(|l| layer_json(l))
            .collect::<Vec<_>>())),
        OutputFormat::Text => {
            for layer in layers {
                println!(
                    "{}  {} {}  {} triples",
                    layer.id().short_hex().yellow().bold(),
                    format!("+{}", layer.triple_addition_count()).green(),
                    format!("-{}", layer.triple_removal_count()).red(),
                    layer.total_triple_count()
                );
            }
            Ok(())
        }
    }
}

fn cmd_squash(store: &Store, args: &GraphArgs, format: OutputFormat) -> anyhow::Result<()> {
    let graph = open_graph(store, &args.graph)?;
    let head = graph
        .head()?
        .with_context(|| format!("graph {} has no head", args.graph))?;
    let squashed = store.squash(&head)?;
    if !graph.set_head(&squashed)? {
        bail!("graph {} moved while squashing", args.graph);
    }
    match format {
        OutputFormat::Json => print_json(json!({
            "from": head.id().to_hex(),
            "layer": layer_json(&squashed),
        })),
        OutputFormat::Text => {
            println!(
                "{} Squashed {} layers into {}",
                "✓".green().bold(),
                head.depth(),
                squashed.id().to_hex().cyan()
            );
            Ok(())
        }
    }
}

fn cmd_export(store: &Store, args: &ExportArgs, format: OutputFormat) -> anyhow::Result<()> {
    let ids = parse_ids(&args.layers)?;
    let pack = store.export_layers(&ids)?;
    std::fs::write(&args.out, &pack)
        .with_context(|| format!("writing {}", args.out.display()))?;
    let layers = terrace_sdk::layerids_and_parents(&pack)?.len();
    match format {
        OutputFormat::Json => print_json(json!({
            "pack": args.out.display().to_string(),
            "layers": layers,
            "bytes": pack.len(),
        })),
        OutputFormat::Text => {
            println!(
                "{} Exported {} layers ({} bytes) to {}",
                "✓".green().bold(),
                layers,
                pack.len(),
                args.out.display()
            );
            Ok(())
        }
    }
}

fn cmd_import(store: &Store, args: &ImportArgs, format: OutputFormat) -> anyhow::Result<()> {
    let pack = std::fs::read(&args.pack)
        .with_context(|| format!("reading {}", args.pack.display()))?;
    let report = if args.layers.is_empty() {
        store.import_all(&pack)?
    } else {
        store.import_layers(&pack, &parse_ids(&args.layers)?)?
    };
    match format {
        OutputFormat::Json => print_json(json!({
            "imported": report.imported.iter().map(LayerId::to_hex).collect::<Vec<_>>(),
            "skipped": report.skipped,
        })),
        OutputFormat::Text => {
            println!(
                "{} Imported {} layers, {} already present",
                "✓".green().bold(),
                report.imported.len(),
                report.skipped
            );
            Ok(())
        }
    }
}

fn cmd_manifest(args: &ManifestArgs, format: OutputFormat) -> anyhow::Result<()> {
    let pack = std::fs::read(&args.pack)
        .with_context(|| format!("reading {}", args.pack.display()))?;
    let manifest = terrace_sdk::layerids_and_parents(&pack)?;
    match format {
        OutputFormat::Json => print_json(json!(manifest
            .iter()
            .map(|(id, parent)| json!({
                "id": id.to_hex(),
                "parent": parent.map(|p| p.to_hex()),
            }))
            .collect::<Vec<_>>())),
        OutputFormat::Text => {
            for (id, parent) in manifest {
                match parent {
                    Some(parent) => println!("{} <- {}", id.to_hex().yellow(), parent.to_hex()),
                    None => println!("{} (base)", id.to_hex().yellow()),
                }
            }
            Ok(())
        }
    }
}
