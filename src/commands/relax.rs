//! # relax 子命令实现
//!
//! 结构预弛豫 + 可选 MD 摇晃测试，带 sanity / provenance 报告。
//!
//! ## 流程（单结构）
//! 1. 解析 CIF/POSCAR
//! 2. FIRE 弛豫到 fmax（日志 opt.log）
//! 3. 写出 relaxed.cif 与 POSCAR
//! 4. 可选 Langevin MD（md.log, md_summary.json, md_final.cif）
//! 5. 写出 sanity.json 与 provenance.json
//!
//! 目录输入进入批量模式：每个结构一个输出子目录，rayon 并行。
//!
//! ## 依赖关系
//! - 使用 `cli/relax.rs` 定义的参数
//! - 使用 `relax/` 模块进行弛豫、MD 与报告
//! - 使用 `batch/` 模块进行批量处理
//! - 使用 `parsers/` 读写结构

use crate::batch::{BatchRunner, FileCollector, ProcessResult};
use crate::cli::relax::RelaxArgs;
use crate::error::{MatscreenError, Result};
use crate::parsers::{self, cif, poscar};
use crate::relax::report::{self, MdSummary, Provenance, SanitySummary};
use crate::relax::{Fire, Langevin, LangevinParams, Potential, RelaxOutcome, UffLennardJones};
use crate::utils::output;

use std::fs;
use std::path::{Path, PathBuf};
use tabled::{Table, Tabled};

/// Langevin 恒温器摩擦系数 (fs⁻¹)
const MD_FRICTION_PER_FS: f64 = 0.02;

/// 单结构运行汇总
struct RelaxReport {
    name: String,
    formula: String,
    num_atoms: usize,
    source_format: String,
    volume_per_atom: f64,
    outcome: RelaxOutcome,
    sanity: SanitySummary,
}

/// 终端汇总表格行
#[derive(Tabled)]
struct SummaryRow {
    #[tabled(rename = "Property")]
    property: String,
    #[tabled(rename = "Value")]
    value: String,
}

/// 执行预弛豫
pub fn execute(args: RelaxArgs) -> Result<()> {
    output::print_header("Structure Pre-Relaxation");

    if args.input.is_file() {
        execute_single(&args)
    } else if args.input.is_dir() {
        execute_batch(&args)
    } else {
        Err(MatscreenError::FileNotFound {
            path: args.input.display().to_string(),
        })
    }
}

/// 单文件模式
fn execute_single(args: &RelaxArgs) -> Result<()> {
    output::print_info(&format!("Single structure mode: '{}'", args.input.display()));
    output::print_info(&format!(
        "fmax = {} eV/Å, max {} steps",
        args.fmax, args.max_steps
    ));

    let report = relax_structure(&args.input, &args.outdir, args)?;

    output::print_success(&format!(
        "Loaded structure: {} ({}, {} atoms, {} format)",
        report.name, report.formula, report.num_atoms, report.source_format
    ));

    if report.outcome.converged {
        output::print_success(&format!(
            "Relaxation converged in {} steps",
            report.outcome.steps
        ));
    } else {
        output::print_warning(&format!(
            "Relaxation did NOT converge within {} steps (fmax = {:.4} eV/Å)",
            report.outcome.steps, report.outcome.max_force
        ));
    }

    print_summary_table(&report, args);

    for reason in &report.sanity.reasons {
        output::print_flag(reason);
    }

    output::print_success(&format!("Outputs in '{}'", args.outdir.display()));
    Ok(())
}

/// 批量处理模式
fn execute_batch(args: &RelaxArgs) -> Result<()> {
    output::print_info(&format!("Batch mode: directory '{}'", args.input.display()));

    let collector = FileCollector::new(args.input.clone())
        .with_pattern(&args.pattern)
        .recursive(args.recursive);

    let files = collector.collect();

    if files.is_empty() {
        output::print_warning(&format!(
            "No matching files found with pattern '{}'",
            args.pattern
        ));
        return Ok(());
    }

    output::print_info(&format!("Found {} structure files", files.len()));

    fs::create_dir_all(&args.outdir).map_err(|e| MatscreenError::FileWriteError {
        path: args.outdir.display().to_string(),
        source: e,
    })?;

    let runner = BatchRunner::new(args.jobs);
    let result = runner.run(files, |file| process_batch_file(file, args));

    output::print_separator();
    output::print_success(&format!(
        "Batch complete: {} processed ({} success, {} skipped, {} failed)",
        result.total(),
        result.success,
        result.skipped,
        result.failed
    ));

    if !result.failures.is_empty() {
        output::print_warning("Failed structures:");
        for (path, err) in result.failures.iter().take(10) {
            output::print_error(&format!("  {}: {}", path, err));
        }
        if result.failures.len() > 10 {
            output::print_warning(&format!("  ... and {} more", result.failures.len() - 10));
        }
    }

    Ok(())
}

/// 处理批量模式中的单个文件
fn process_batch_file(input: &PathBuf, args: &RelaxArgs) -> ProcessResult {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("structure");
    let outdir = args.outdir.join(stem);

    if outdir.exists() && !args.overwrite {
        return ProcessResult::Skipped(format!("Output exists, skipping: {}", outdir.display()));
    }

    match relax_structure(input, &outdir, args) {
        Ok(report) => {
            let mut msg = format!("{} -> {}", input.display(), outdir.display());
            if report.sanity.flagged {
                msg.push_str(" [flagged]");
            }
            ProcessResult::Success(msg)
        }
        Err(e) => ProcessResult::Failed(input.display().to_string(), e.to_string()),
    }
}

/// 弛豫单个结构并写出全部输出
fn relax_structure(input: &Path, outdir: &Path, args: &RelaxArgs) -> Result<RelaxReport> {
    fs::create_dir_all(outdir).map_err(|e| MatscreenError::FileWriteError {
        path: outdir.display().to_string(),
        source: e,
    })?;

    let mut crystal = parsers::parse_structure_file(input)?;
    let name = crystal.name.clone();
    let formula = crystal.composition().reduced_formula();
    let num_atoms = crystal.num_atoms();
    let source_format = crystal.source_format.clone().unwrap_or_default();

    let potential = UffLennardJones::new();

    // 弛豫
    let fire = Fire::new(args.fmax, args.max_steps);
    let mut opt_log = String::new();
    let outcome = fire.run(&mut crystal, &potential, &mut opt_log)?;
    write_text(&outdir.join("opt.log"), &opt_log)?;

    // 弛豫结构
    let relaxed_cif = outdir.join("relaxed.cif");
    let relaxed_poscar = outdir.join("POSCAR");
    cif::write_cif_file(&crystal, &relaxed_cif)?;
    poscar::write_poscar_file(&crystal, &relaxed_poscar)?;

    // 可选 MD 摇晃测试
    let mut md_drift = None;
    if args.md_steps > 0 {
        let mut shaken = crystal.clone();
        let langevin = Langevin::new(LangevinParams {
            steps: args.md_steps,
            timestep_fs: args.md_timestep_fs,
            temperature_k: args.md_temperature_k,
            friction_per_fs: MD_FRICTION_PER_FS,
            seed: args.seed,
        });

        let mut md_log = String::new();
        let md = langevin.run(&mut shaken, &potential, &mut md_log)?;
        write_text(&outdir.join("md.log"), &md_log)?;

        report::write_json(
            &MdSummary {
                energies: md.energies.clone(),
            },
            &outdir.join("md_summary.json"),
        )?;
        cif::write_cif_file(&shaken, &outdir.join("md_final.cif"))?;

        md_drift = md.drift_mev_per_atom;
    }

    // sanity
    let sanity = SanitySummary::evaluate(
        outcome.max_force,
        outcome.energy,
        args.md_steps,
        md_drift,
        args.fmax,
        args.drift_threshold_mev_per_atom,
    );
    let sanity_path = outdir.join("sanity.json");
    report::write_json(&sanity, &sanity_path)?;

    // provenance
    let mut prov = Provenance::new(potential.name(), input.display().to_string())
        .arg("fmax", args.fmax)
        .arg("max_steps", args.max_steps)
        .arg("md_steps", args.md_steps)
        .arg("md_timestep_fs", args.md_timestep_fs)
        .arg("md_temperature_K", args.md_temperature_k)
        .arg("seed", args.seed)
        .arg("drift_threshold_meV_per_atom", args.drift_threshold_mev_per_atom)
        .output("opt_log", &outdir.join("opt.log"))
        .output("relaxed_cif", &relaxed_cif)
        .output("relaxed_poscar", &relaxed_poscar)
        .output("sanity", &sanity_path);

    if args.md_steps > 0 {
        prov = prov
            .output("md_log", &outdir.join("md.log"))
            .output("md_summary", &outdir.join("md_summary.json"))
            .output("md_final_cif", &outdir.join("md_final.cif"));
    }

    report::write_json(&prov, &outdir.join("provenance.json"))?;

    Ok(RelaxReport {
        name,
        formula,
        num_atoms,
        source_format,
        volume_per_atom: crystal.volume_per_atom(),
        outcome,
        sanity,
    })
}

/// 终端汇总表格
fn print_summary_table(report: &RelaxReport, args: &RelaxArgs) {
    let mut rows = vec![
        SummaryRow {
            property: "Structure".to_string(),
            value: format!("{} ({})", report.name, report.formula),
        },
        SummaryRow {
            property: "Atoms".to_string(),
            value: report.num_atoms.to_string(),
        },
        SummaryRow {
            property: "Final energy (eV)".to_string(),
            value: format!("{:.6}", report.outcome.energy),
        },
        SummaryRow {
            property: "Max force (eV/Å)".to_string(),
            value: format!("{:.6}", report.outcome.max_force),
        },
        SummaryRow {
            property: "Relaxation steps".to_string(),
            value: report.outcome.steps.to_string(),
        },
        SummaryRow {
            property: "Volume (Å³/atom)".to_string(),
            value: format!("{:.3}", report.volume_per_atom),
        },
    ];

    if args.md_steps > 0 {
        rows.push(SummaryRow {
            property: "MD steps".to_string(),
            value: args.md_steps.to_string(),
        });
        rows.push(SummaryRow {
            property: "MD drift (meV/atom)".to_string(),
            value: report
                .sanity
                .md_energy_drift
                .map(|d| format!("{:.3}", d))
                .unwrap_or_else(|| "n/a".to_string()),
        });
    }

    rows.push(SummaryRow {
        property: "Flagged".to_string(),
        value: if report.sanity.flagged { "YES" } else { "no" }.to_string(),
    });

    let table = Table::new(&rows);
    println!("{}", table);
}

/// 写出文本文件
fn write_text(path: &Path, content: &str) -> Result<()> {
    fs::write(path, content).map_err(|e| MatscreenError::FileWriteError {
        path: path.display().to_string(),
        source: e,
    })
}
