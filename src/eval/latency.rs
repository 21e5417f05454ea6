//! Memory latency sweep: CPI of one program against instruction and
//! data port latencies, written as CSV and plotted as SVG.

use std::error::Error;
use std::fs;
use std::path::Path;

use plotters::prelude::*;
use sim_lib::cpu::CPUPolicy;
use sim_lib::flags::Address;
use sim_lib::run_wrapper;
use tracing_subscriber::EnvFilter;

const IMEM_LATENCIES: [u32; 5] = [0, 1, 2, 3, 4];
const DMEM_LATENCIES: [u32; 4] = [0, 1, 2, 4];

const CSV_PATH: &str = "eval/latency_eval.csv";
const SVG_PATH: &str = "eval/latency_eval.svg";

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let mut args = std::env::args().skip(1);
    let program = args.next().ok_or("You should specify exactly one program")?;
    let raw_base = args
        .next()
        .map(|base| base.parse::<Address>().map(|Address(a)| a))
        .transpose()?;

    fs::create_dir_all("eval")?;
    let mut writer = csv::Writer::from_path(CSV_PATH)?;
    writer.write_record(["imem_latency", "dmem_latency", "cycles", "instructions", "cpi"])?;

    // One line per data latency
    let mut data: Vec<Vec<(u32, f64)>> = vec![vec![]; DMEM_LATENCIES.len()];
    let mut y_max: f64 = 0.;
    for (i, dmem_latency) in DMEM_LATENCIES.iter().enumerate() {
        for imem_latency in IMEM_LATENCIES {
            let policy = CPUPolicy {
                imem_latency,
                dmem_latency: *dmem_latency,
                ..Default::default()
            };
            let stats = run_wrapper::run(Path::new(&program), raw_base, policy, None)?;
            writer.write_record([
                imem_latency.to_string(),
                dmem_latency.to_string(),
                stats.history.cycle_count.to_string(),
                stats.history.inst_count.to_string(),
                format!("{:.3}", stats.cpi()),
            ])?;
            data[i].push((imem_latency, stats.cpi()));
            y_max = y_max.max(stats.cpi());
        }
    }
    writer.flush()?;

    let program_name = Path::new(&program)
        .file_name()
        .map_or_else(|| program.clone(), |name| name.to_string_lossy().into_owned());
    let plot_title = format!("Latency evaluation (CPI): {}", program_name);

    let root = SVGBackend::new(SVG_PATH, (800, 600)).into_drawing_area();
    root.fill(&WHITE)?;

    let x_max = IMEM_LATENCIES[IMEM_LATENCIES.len() - 1];
    let mut ctx = ChartBuilder::on(&root)
        .caption(plot_title.as_str(), ("sans-serif", 40).into_font())
        .margin(5)
        .x_label_area_size(40)
        .y_label_area_size(40)
        .build_cartesian_2d(0..x_max, 0.0..y_max * 1.1)?;
    ctx.configure_mesh()
        .x_desc("Instruction memory latency")
        .y_desc("CPI")
        .draw()?;

    for (i, dmem_latency) in DMEM_LATENCIES.iter().enumerate() {
        let series = data[i].iter().copied();
        let label = format!("Data memory latency = {}", dmem_latency);
        let color = Palette99::pick(i).to_rgba();
        ctx.draw_series(LineSeries::new(series, color))?
            .label(label)
            .legend(move |(x, y)| {
                PathElement::new(vec![(x, y), (x + 20, y)], color)
            });
    }

    ctx.configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()?;
    root.present()?;

    Ok(())
}
