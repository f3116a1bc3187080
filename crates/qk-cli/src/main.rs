use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use qk_core::cast::{CLongDouble, Complex64, Complex128, LongDouble};
use qk_core::serde_compat::WireFloat;
use qk_core::{
    ByteOrder, Element, LoopRegistry, QUATERNION_DESCRIPTOR, Quaternion, RawView, RawViewMut,
    ScalarKind, StridedView, StridedViewMut, TypeTag, argmax, argmin, cast_into, count_nonzero,
    export_json, import_json,
};

const BYTE_ORDERS: [&str; 4] = ["native", "swapped", "little", "big"];

#[derive(Parser)]
#[command(name = "qk", about = "Quaternion kernel: element-wise loops, casts and raw buffers")]
struct Cli {
    /// Enable verbose debug output
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the element descriptor and every registered loop
    Describe,

    /// Run a registered loop over a JSON array of quaternions
    Apply {
        /// Loop name (add, multiply, log, isnan, ...)
        op: String,

        /// Left (or only) operand
        lhs: PathBuf,

        /// Right operand: a second quaternion array of the same length
        #[arg(long, conflicts_with = "scalar")]
        rhs: Option<PathBuf>,

        /// Right operand: one real number applied to every element
        #[arg(long, allow_negative_numbers = true)]
        scalar: Option<f64>,

        /// Write the result here instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Index of the maximal element (NaN wins)
    Argmax {
        path: PathBuf,

        /// Find the minimal element instead
        #[arg(long)]
        min: bool,
    },

    /// Cast scalar values of the given kind into quaternions
    Cast {
        /// Source kind (int32, float64, complex128, ...)
        kind: String,

        /// Values to cast; complex values are written `re,im`
        #[arg(required = true, allow_negative_numbers = true)]
        values: Vec<String>,
    },

    /// Write a JSON quaternion array as a raw 32-byte-per-element buffer
    Pack {
        input: PathBuf,
        output: PathBuf,

        #[arg(long, default_value = "native", value_parser = BYTE_ORDERS)]
        byte_order: String,
    },

    /// Read a raw quaternion buffer back into JSON
    Unpack {
        input: PathBuf,
        output: PathBuf,

        #[arg(long, default_value = "native", value_parser = BYTE_ORDERS)]
        byte_order: String,
    },
}

/// Relative paths resolve against `QK_DATA_DIR` when it is set.
fn resolve_path(path: &Path) -> PathBuf {
    if path.is_relative()
        && let Ok(dir) = std::env::var("QK_DATA_DIR")
    {
        return PathBuf::from(dir).join(path);
    }
    path.to_path_buf()
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into())
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match &cli.command {
        Commands::Describe => cmd_describe(),
        Commands::Apply {
            op,
            lhs,
            rhs,
            scalar,
            output,
        } => cmd_apply(op, lhs, rhs.as_deref(), *scalar, output.as_deref()),
        Commands::Argmax { path, min } => cmd_argmax(path, *min),
        Commands::Cast { kind, values } => cmd_cast(kind, values),
        Commands::Pack {
            input,
            output,
            byte_order,
        } => cmd_pack(input, output, ByteOrder::from_str_lossy(byte_order)),
        Commands::Unpack {
            input,
            output,
            byte_order,
        } => cmd_unpack(input, output, ByteOrder::from_str_lossy(byte_order)),
    }
}

fn load_values(path: &Path) -> Result<Vec<Quaternion>> {
    let path = resolve_path(path);
    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    import_json(&json).with_context(|| format!("failed to parse {}", path.display()))
}

fn write_text(path: &Path, text: &str) -> Result<()> {
    let path = resolve_path(path);
    std::fs::write(&path, text).with_context(|| format!("failed to write {}", path.display()))
}

fn cmd_describe() -> Result<()> {
    let d = QUATERNION_DESCRIPTOR;
    println!("name:       {}", d.name);
    println!("kind:       {}", d.kind);
    println!("type_char:  {}", d.type_char);
    println!("byteorder:  {}", d.byteorder);
    println!("elsize:     {}", d.elsize);
    println!("alignment:  {}", d.alignment);

    let registry = LoopRegistry::with_builtin_loops();
    println!("loops:      {}", registry.len());
    for entry in registry.entries() {
        println!("  {:<14} {}", entry.name, entry.signature);
    }
    Ok(())
}

fn cmd_apply(
    op: &str,
    lhs_path: &Path,
    rhs_path: Option<&Path>,
    scalar: Option<f64>,
    output: Option<&Path>,
) -> Result<()> {
    let lhs = load_values(lhs_path)?;
    let rhs = rhs_path.map(load_values).transpose()?;
    let n = lhs.len();

    if let Some(rhs) = &rhs
        && rhs.len() != n
    {
        bail!("operand lengths differ: lhs has {n} elements, rhs has {}", rhs.len());
    }

    let registry = LoopRegistry::with_builtin_loops();
    let input_types: Vec<TypeTag> = match (&rhs, scalar) {
        (Some(_), _) => vec![TypeTag::Quaternion, TypeTag::Quaternion],
        (None, Some(_)) => vec![TypeTag::Quaternion, TypeTag::DOUBLE],
        (None, None) => vec![TypeTag::Quaternion],
    };
    let entry = registry
        .resolve(op, &input_types)
        .with_context(|| format!("no loop for '{op}' with these operands"))?;
    tracing::debug!(op, signature = %entry.signature, n, "applying loop");

    let scalar_cell = scalar.unwrap_or_default();
    let mut inputs = vec![RawView::new(bytemuck::cast_slice(&lhs), Quaternion::SIZE)];
    if let Some(rhs) = &rhs {
        inputs.push(RawView::new(bytemuck::cast_slice(rhs), Quaternion::SIZE));
    } else if scalar.is_some() {
        inputs.push(RawView::new(bytemuck::bytes_of(&scalar_cell), 0));
    }

    let out_type = entry.signature.output;
    let itemsize = out_type.itemsize();
    let mut out = vec![0u8; n * itemsize];
    entry
        .call(&inputs, RawViewMut::new(&mut out, itemsize), n)
        .with_context(|| format!("loop '{op}' failed"))?;

    let rendered = render_output(out_type, &out)?;
    match output {
        Some(path) => {
            write_text(path, &rendered)?;
            println!("wrote {n} results to {}", path.display());
        }
        None => println!("{rendered}"),
    }
    Ok(())
}

fn render_output(out_type: TypeTag, bytes: &[u8]) -> Result<String> {
    let text = match out_type {
        TypeTag::Quaternion => export_json(&StridedView::<Quaternion>::contiguous(bytes).to_vec())?,
        TypeTag::Scalar(ScalarKind::Bool) => {
            serde_json::to_string(&StridedView::<bool>::contiguous(bytes).to_vec())?
        }
        TypeTag::Scalar(ScalarKind::Float64) => {
            let values: Vec<WireFloat> = StridedView::<f64>::contiguous(bytes)
                .iter()
                .map(WireFloat::from_f64)
                .collect();
            serde_json::to_string(&values)?
        }
        TypeTag::Scalar(kind) => bail!("no output rendering for {kind}"),
    };
    Ok(text)
}

fn cmd_argmax(path: &Path, min: bool) -> Result<()> {
    let values = load_values(path)?;
    let view = StridedView::from_slice(&values);
    let found = if min { argmin(&view) } else { argmax(&view) };
    let index = found.with_context(|| format!("no elements in {}", path.display()))?;

    println!("index:      {index}");
    println!("value:      {}", values[index]);
    println!("nonzero:    {}/{}", count_nonzero(&view), values.len());
    Ok(())
}

fn cmd_cast(kind_name: &str, values: &[String]) -> Result<()> {
    let kind = ScalarKind::from_name(kind_name)
        .or_else(|| {
            let mut chars = kind_name.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => ScalarKind::from_code(c),
                _ => None,
            }
        })
        .with_context(|| format!("unknown scalar kind '{kind_name}'"))?;

    let bytes = encode_values(kind, values)?;
    let mut out = vec![Quaternion::zero(); values.len()];
    cast_into(
        kind,
        RawView::new(&bytes, kind.itemsize()),
        &mut StridedViewMut::from_slice_mut(&mut out),
    )?;

    for q in out {
        println!("{q}");
    }
    Ok(())
}

/// Parse `values` as `kind` and lay them out natively, one per cell.
fn encode_values(kind: ScalarKind, values: &[String]) -> Result<Vec<u8>> {
    match kind {
        ScalarKind::Bool => encode(values, parse_bool),
        ScalarKind::Int8 => encode(values, |s| Ok(s.parse::<i8>()?)),
        ScalarKind::UInt8 => encode(values, |s| Ok(s.parse::<u8>()?)),
        ScalarKind::Int16 => encode(values, |s| Ok(s.parse::<i16>()?)),
        ScalarKind::UInt16 => encode(values, |s| Ok(s.parse::<u16>()?)),
        ScalarKind::Int32 => encode(values, |s| Ok(s.parse::<i32>()?)),
        ScalarKind::UInt32 => encode(values, |s| Ok(s.parse::<u32>()?)),
        ScalarKind::Int64 => encode(values, |s| Ok(s.parse::<i64>()?)),
        ScalarKind::UInt64 => encode(values, |s| Ok(s.parse::<u64>()?)),
        ScalarKind::Float32 => encode(values, |s| Ok(s.parse::<f32>()?)),
        ScalarKind::Float64 => encode(values, |s| Ok(s.parse::<f64>()?)),
        ScalarKind::LongDouble => encode(values, |s| Ok(LongDouble::from_f64(s.parse()?))),
        ScalarKind::Complex64 => encode(values, |s| {
            let (re, im) = parse_complex(s)?;
            Ok(Complex64 {
                re: re as f32,
                im: im as f32,
            })
        }),
        ScalarKind::Complex128 => encode(values, |s| {
            let (re, im) = parse_complex(s)?;
            Ok(Complex128 { re, im })
        }),
        ScalarKind::CLongDouble => encode(values, |s| {
            let (re, im) = parse_complex(s)?;
            Ok(CLongDouble {
                re: LongDouble::from_f64(re),
                im: LongDouble::from_f64(im),
            })
        }),
    }
}

fn encode<T: Element>(values: &[String], parse: impl Fn(&str) -> Result<T>) -> Result<Vec<u8>> {
    let mut bytes = vec![0u8; values.len() * T::SIZE];
    for (cell, s) in bytes.chunks_exact_mut(T::SIZE).zip(values) {
        let value = parse(s.trim()).with_context(|| format!("invalid value '{s}'"))?;
        value.write(cell, ByteOrder::Native);
    }
    Ok(bytes)
}

fn parse_bool(s: &str) -> Result<bool> {
    match s.to_ascii_lowercase().as_str() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        _ => bail!("expected true/false"),
    }
}

fn parse_complex(s: &str) -> Result<(f64, f64)> {
    match s.split_once(',') {
        Some((re, im)) => Ok((re.trim().parse()?, im.trim().parse()?)),
        None => Ok((s.parse()?, 0.0)),
    }
}

fn cmd_pack(input: &Path, output: &Path, order: ByteOrder) -> Result<()> {
    let values = load_values(input)?;
    let mut bytes = vec![0u8; values.len() * Quaternion::SIZE];
    {
        let mut view = StridedViewMut::<Quaternion>::contiguous(&mut bytes).with_order(order);
        qk_core::raw::write_many(&values, &mut view)?;
    }

    let path = resolve_path(output);
    std::fs::write(&path, &bytes).with_context(|| format!("failed to write {}", path.display()))?;
    println!(
        "packed {} quaternions ({} bytes, {}) to {}",
        values.len(),
        bytes.len(),
        order.as_str(),
        path.display()
    );
    Ok(())
}

fn cmd_unpack(input: &Path, output: &Path, order: ByteOrder) -> Result<()> {
    let path = resolve_path(input);
    let bytes = std::fs::read(&path).with_context(|| format!("failed to read {}", path.display()))?;
    if bytes.len() % Quaternion::SIZE != 0 {
        bail!(
            "{} is {} bytes, not a multiple of the {}-byte element size",
            path.display(),
            bytes.len(),
            Quaternion::SIZE
        );
    }

    let values = StridedView::<Quaternion>::contiguous(&bytes)
        .with_order(order)
        .to_vec();
    let json = export_json(&values).context("failed to serialize values")?;
    write_text(output, &json)?;
    println!("unpacked {} quaternions to {}", values.len(), output.display());
    Ok(())
}
