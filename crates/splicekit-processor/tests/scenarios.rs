//! End to end processing scenarios

use splicekit_core::{Diagnostics, Error};
use splicekit_gcode::{BlockClass, Classifier, GcodeCommand, LayerPlan, SplicePolicy, TowerBounds};
use splicekit_processor::{
    consume_purge, Collaborators, Disposition, Pipeline, ProcessorContext, PurgeStrategy, Rewrite,
    RewriteEngine, TowerGenerator, TowerLayout,
};
use splicekit_settings::Settings;

fn has_message(messages: &[splicekit_core::Diagnostic], text: &str) -> bool {
    messages.iter().any(|d| d.message.contains(text))
}

/// Tower measured from a brim spanning (100, 100)-(120, 120)
fn measured_tower() -> TowerBounds {
    let mut tower = TowerBounds::new();
    tower.grow(Some(100.0), Some(100.0), 0.45);
    tower.grow(Some(120.0), Some(120.0), 0.45);
    tower.freeze();
    tower
}

fn path_engine<'a>(
    settings: &'a Settings,
    diagnostics: &'a mut Diagnostics,
    strategy: PurgeStrategy,
    layers: LayerPlan,
    collaborators: Collaborators,
) -> RewriteEngine<'a> {
    let ctx = ProcessorContext::new(
        strategy,
        true,
        false,
        SplicePolicy::from_settings(settings, strategy.replaces_purge()),
    );
    RewriteEngine::new(
        settings,
        layers,
        measured_tower(),
        ctx,
        collaborators,
        diagnostics,
    )
}

fn feed(engine: &mut RewriteEngine<'_>, lines: &[(&str, BlockClass)]) -> Vec<Rewrite> {
    lines
        .iter()
        .map(|(line, class)| {
            let mut g = GcodeCommand::parse(*line);
            g.class = *class;
            engine.process(g)
        })
        .collect()
}

/// Tower generator that marks its output with comments
struct ScriptedTower;

impl TowerGenerator for ScriptedTower {
    fn name(&self) -> &str {
        "scripted"
    }

    fn create_layers(
        &mut self,
        _bounds: &TowerBounds,
        _ctx: &mut ProcessorContext,
        _settings: &Settings,
    ) -> TowerLayout {
        TowerLayout {
            solid_layer_length: 12.5,
            sparse_layer_length: 3.0,
        }
    }

    fn generate_brim(
        &mut self,
        _ctx: &mut ProcessorContext,
        _settings: &Settings,
        out: &mut Vec<String>,
    ) {
        out.push(";GENERATED BRIM".to_string());
    }

    fn generate_sequence(
        &mut self,
        ctx: &mut ProcessorContext,
        _settings: &Settings,
        out: &mut Vec<String>,
    ) {
        out.push(format!(";GENERATED PURGE {:.2}mm", ctx.side_wipe_length));
        consume_purge(ctx);
    }
}

#[test]
fn short_first_splice_is_reported_not_extended() {
    let lines = [
        ";LAYER 0",
        "T0",
        "; CP TOOLCHANGE END",
        "G1 X10 Y10 E40",
        ";LAYER 1",
        "T1",
        "; CP TOOLCHANGE END",
        "G1 X20 Y10 E20",
    ];

    let output = Pipeline::new(Settings::new()).run(&lines).unwrap();
    let report = &output.report;

    assert_eq!(report.splices.len(), 2);
    assert_eq!(report.splices[0].tool, 0);
    assert_eq!(report.splices[0].length, 40.0);
    assert_eq!(report.filament_short.get(&1), Some(&60.0));
    assert!(has_message(
        &report.diagnostics,
        "First splice (40.0mm) too short in layer 1. Minimal length is 100.0mm"
    ));
    assert!(has_message(&report.diagnostics, "SPLICEOFFSET not defined"));
    assert_eq!(report.inputs_used, vec![0, 1]);
    // the closing unload adds the runout filament to the last tool
    assert_eq!(report.extruded_per_tool.get(&1), Some(&170.0));

    assert!(output.lines.contains(&";-- removed [Color Change] - T1".to_string()));
    assert!(output.lines.contains(&"G1 X20 Y10 E20".to_string()));
}

#[test]
fn unmarked_stream_passes_through_every_strategy() {
    let lines = [
        ";LAYER 0",
        "G1 X10 Y10 E1",
        ";LAYER 1",
        "G1 X20 Y20 E1",
        "G1 E-0.8 F2100",
        "G1 E0.8 F2100",
        "G1 X30 Y20 E1",
    ];

    let mut settings = Settings::new();
    let mut diagnostics = Diagnostics::new();
    let program = Classifier::new(&mut settings, &mut diagnostics).classify(&lines);
    assert!(program
        .instructions
        .iter()
        .all(|i| i.class == BlockClass::Normal));

    let configure: [fn(&mut Settings); 4] = [
        |_| {},
        |s| s.purge.side_wipe = true,
        |s| s.purge.full_purge_reduction = true,
        |s| s.purge.tower_delta = true,
    ];
    for apply in configure {
        let mut settings = Settings::new();
        apply(&mut settings);
        let output = Pipeline::new(settings).run(&lines).unwrap();
        assert_eq!(output.lines, lines);
        assert!((output.report.total_extruded - 3.0).abs() < 1e-9);
    }
}

#[test]
fn tower_delta_skips_empty_grid_layer() {
    let lines = [
        ";LAYER 0",
        "; CP WIPE TOWER FIRST LAYER BRIM START",
        "G1 X100 Y100 E1",
        "G1 X120 Y120 E1",
        "; CP WIPE TOWER FIRST LAYER BRIM END",
        "G1 X50 Y50 E1",
        ";LAYER 1",
        "; CP EMPTY GRID START",
        "G1 X105 Y105",
        "G1 X110 Y110 E1",
        "; CP EMPTY GRID END",
        "G1 X50 Y50 E1",
        ";LAYER 2",
        "G1 X60 Y60 E1",
    ];

    let mut settings = Settings::new();
    settings.purge.max_tower_z_delta = 1.0;
    let mut diagnostics = Diagnostics::new();
    let program = Classifier::new(&mut settings, &mut diagnostics).classify(&lines);

    let mut layers = program.layers;
    assert!(layers.records()[1].skippable);
    let outcome = layers.optimize_tower_skip(1.0, settings.printer.layer_height, false);
    assert_eq!(outcome.layers, 1);

    let ctx = ProcessorContext::new(
        PurgeStrategy::TowerDelta,
        true,
        false,
        Default::default(),
    );
    let mut engine = RewriteEngine::new(
        &settings,
        layers,
        program.tower,
        ctx,
        Collaborators::default(),
        &mut diagnostics,
    );

    let rewrites: Vec<_> = program
        .instructions
        .into_iter()
        .map(|g| engine.process(g))
        .collect();

    assert_eq!(rewrites[8].disposition, Disposition::Suppress);
    assert_eq!(rewrites[8].instruction, ";-- removed [tower skipped] - G1 X105 Y105");
    assert!(rewrites[8]
        .inserted
        .contains(&";  GRID SKIP --TOWER DELTA   0.20mm".to_string()));
    assert_eq!(rewrites[9].disposition, Disposition::Suppress);
    assert_eq!(rewrites[11].instruction, "G1 X50 Y50 E1");
    assert_eq!(rewrites[11].disposition, Disposition::Emit);
    assert!((engine.context().tower_z_delta - 0.2).abs() < 1e-9);
    assert!(!engine.context().tower_skipped);
}

#[test]
fn tower_delta_pipeline_reports_plan() {
    let lines = [
        ";LAYER 0",
        "; CP WIPE TOWER FIRST LAYER BRIM START",
        "G1 X100 Y100 E1",
        "G1 X120 Y120 E1",
        "; CP WIPE TOWER FIRST LAYER BRIM END",
        ";LAYER 1",
        "; CP EMPTY GRID START",
        "G1 X105 Y105 E1",
        "; CP EMPTY GRID END",
        "G1 X50 Y50 E1",
        ";LAYER 2",
    ];
    let mut settings = Settings::new();
    settings.purge.max_tower_z_delta = 1.0;

    let output = Pipeline::new(settings).run(&lines).unwrap();
    assert_eq!(output.report.strategy, PurgeStrategy::TowerDelta);
    assert!(has_message(
        &output.report.diagnostics,
        "Purge tower delta in effect: 1 layers or 0.20mm"
    ));
    assert!(output
        .lines
        .contains(&";-- removed [tower skipped] - G1 X105 Y105 E1".to_string()));
}

#[test]
fn unretract_is_clamped_to_outstanding_retraction() {
    let settings = Settings::new();
    let mut diagnostics = Diagnostics::new();
    let mut engine = RewriteEngine::new(
        &settings,
        Default::default(),
        Default::default(),
        ProcessorContext::default(),
        Collaborators::default(),
        &mut diagnostics,
    );

    engine.process(GcodeCommand::parse("G1 E-0.5 F2100"));
    assert_eq!(engine.context().retraction, -0.5);

    let rewrite = engine.process(GcodeCommand::parse("G1 E2 F2100"));
    assert_eq!(rewrite.instruction, "G1 E0.5 F2100");
    assert_eq!(engine.context().retraction, 0.0);
}

#[test]
fn side_wipe_strips_off_bed_coordinates() {
    let lines = [
        ";LAYER 0",
        "G1 X10 Y10 E1",
        ";LAYER 1",
        "G1 X300 Y10 E1.5 F1200",
        "G1 X100 Y250 E1 F1200",
        "G1 X100 Y100 E1",
    ];
    let mut settings = Settings::new();
    settings.purge.side_wipe = true;

    let output = Pipeline::new(settings).run(&lines).unwrap();
    assert_eq!(output.report.strategy, PurgeStrategy::SideWipe);
    assert_eq!(
        output.lines,
        vec![
            ";LAYER 0",
            "G1 X10 Y10 E1",
            ";LAYER 1",
            "G1 E1.5 F1200",
            "G1 E1 F1200",
            "G1 X100 Y100 E1",
        ]
    );
}

#[test]
fn path_strategy_without_layers_is_fatal() {
    let lines = ["G1 X10 Y10 E1", "G1 X20 Y10 E1"];
    let mut settings = Settings::new();
    settings.purge.side_wipe = true;

    let err = Pipeline::new(settings).run(&lines).unwrap_err();
    assert!(matches!(err, Error::MissingLayerConfiguration { .. }));
    assert!(has_message(err.diagnostics(), "Layer configuration is missing"));

    let output = Pipeline::new(Settings::new()).run(&lines).unwrap();
    assert_eq!(output.lines, lines);
}

#[test]
fn directives_in_stream_configure_the_run() {
    let lines = [
        ";P2PP SPLICEOFFSET=30",
        ";P2PP MINSTARTSPLICE=50",
        ";P2PP UNKNOWNKEY=1",
        ";LAYER 0",
        "T0",
        "G1 X10 Y10 E60",
    ];

    let output = Pipeline::new(Settings::new()).run(&lines).unwrap();
    let report = &output.report;
    assert!(!has_message(&report.diagnostics, "SPLICEOFFSET not defined"));
    assert!(report
        .diagnostics
        .iter()
        .any(|d| d.line == Some(2)));
    // the purge move outside any tower loses its extrusion
    assert!(output.lines.contains(&"G1 X10 Y10".to_string()));
    assert_eq!(report.splices.len(), 1);
    assert_eq!(report.splices[0].extruder_position, 180.0);
}

#[test]
fn full_purge_reduction_replaces_brim_and_purge() {
    use BlockClass::*;
    let settings = Settings::new();
    let mut diagnostics = Diagnostics::new();
    let collaborators = Collaborators {
        tower: Box::new(ScriptedTower),
        ..Default::default()
    };
    let mut engine = path_engine(
        &settings,
        &mut diagnostics,
        PurgeStrategy::FullPurgeReduction,
        LayerPlan::new(),
        collaborators,
    );

    let rewrites = feed(
        &mut engine,
        &[
            ("; CP WIPE TOWER FIRST LAYER BRIM START", Brim),
            ("G1 X100 Y100 E1", Brim),
            ("; CP WIPE TOWER FIRST LAYER BRIM END", BrimEnd),
            ("T1", ToolPurge),
            ("G1 X105 Y105 E20", ToolPurge),
            ("G1 X110 Y105 E30", ToolPurge),
            ("; CP TOOLCHANGE END", EndPurge),
            ("G1 X50 Y50 E5", Normal),
        ],
    );

    assert_eq!(
        rewrites[1].instruction,
        ";-- removed [replaced by brim code] - G1 X100 Y100 E1"
    );
    assert_eq!(rewrites[1].disposition, Disposition::Suppress);
    assert_eq!(rewrites[2].inserted, vec![";GENERATED BRIM".to_string()]);
    assert_eq!(
        rewrites[4].instruction,
        ";-- removed [side wipe/full purge] - G1 X105 Y105 E20"
    );
    assert_eq!(rewrites[5].disposition, Disposition::Suppress);
    assert!(rewrites[6].inserted.is_empty());
    assert_eq!(
        rewrites[7].inserted,
        vec![
            ";GENERATED PURGE 50.00mm".to_string(),
            ";TOOLCHANGE PROCESSED".to_string(),
        ]
    );
    assert_eq!(rewrites[7].instruction, "G1 X50 Y50 E5");

    let ctx = engine.into_context();
    assert_eq!(ctx.side_wipe_length, 0.0);
    assert!(!ctx.toolchange_processed);
    assert_eq!(ctx.splices.total_extruded(), 55.0);
    assert_eq!(ctx.splices.extruded_per_tool().get(&1), Some(&55.0));

    let messages = diagnostics.into_entries();
    assert!(has_message(
        &messages,
        "Tower location (99.1, 98.2)-(120.9, 121.8), size 21.8x23.6mm"
    ));
    assert!(has_message(
        &messages,
        "Tower layer lengths: solid 12.5mm, sparse 3.0mm"
    ));
}

#[test]
fn side_wipe_removes_brim_and_primes_alternate_purge() {
    use BlockClass::*;
    let lines = [
        ("G1 X10 Y10 E2", Normal),
        ("G1 X100 Y100 E1", Brim),
        ("G1 X120 Y100 E1", Brim),
        ("G1 X50 Y50 E1", Normal),
    ];

    let mut settings = Settings::new();
    settings.purge.side_wipe = true;
    settings.purge.alternate_purge = true;
    let run = |settings: &Settings| {
        let mut diagnostics = Diagnostics::new();
        let mut engine = path_engine(
            settings,
            &mut diagnostics,
            PurgeStrategy::SideWipe,
            LayerPlan::new(),
            Collaborators::default(),
        );
        let rewrites = feed(&mut engine, &lines);
        (rewrites, engine.into_context())
    };

    let (rewrites, ctx) = run(&settings);
    assert_eq!(rewrites[1].inserted, vec![";ALTERNATE PURGE 10.00mm".to_string()]);
    assert_eq!(
        rewrites[1].instruction,
        ";-- removed [side wipe - removed] - G1 X100 Y100 E1"
    );
    assert!(rewrites[2].inserted.is_empty());
    assert_eq!(rewrites[2].disposition, Disposition::Suppress);
    assert_eq!(rewrites[3].instruction, "G1 X50 Y50 E1");
    assert_eq!(rewrites[3].disposition, Disposition::Emit);
    // the primed blob counts as extruded, the removed brim does not
    assert_eq!(ctx.side_wipe_length, 0.0);
    assert_eq!(ctx.splices.total_extruded(), 13.0);

    settings.purge.alternate_purge = false;
    let (rewrites, ctx) = run(&settings);
    assert!(rewrites[1].inserted.is_empty());
    assert_eq!(rewrites[1].disposition, Disposition::Suppress);
    assert_eq!(ctx.splices.total_extruded(), 3.0);
}

#[test]
fn side_wipe_drops_purge_of_skippable_layer() {
    use BlockClass::*;
    let mut layers = LayerPlan::new();
    layers.start_layer(0, 0, false);
    layers.start_layer(2, 1, false);
    layers.start_layer(7, 2, true);

    let mut settings = Settings::new();
    settings.purge.side_wipe = true;
    let mut diagnostics = Diagnostics::new();
    let mut engine = path_engine(
        &settings,
        &mut diagnostics,
        PurgeStrategy::SideWipe,
        layers,
        Collaborators::default(),
    );

    let rewrites = feed(
        &mut engine,
        &[
            (";LAYER 0", Normal),
            ("G1 X10 Y10 E1", Normal),
            (";LAYER 1", Normal),
            ("G1 X30 Y30 E4", Empty),
            ("G1 X105 Y105 E3", Empty),
            ("G1 X106 Y106", EndGrid),
            ("G1 X50 Y50 E1", Normal),
            (";LAYER 2", Normal),
            ("G1 X105 Y105 E4", Empty),
            ("G1 X60 Y60 E1", Normal),
        ],
    );

    assert_eq!(rewrites[3].instruction, ";-- removed [skipped purge] - G1 X30 Y30 E4");
    assert_eq!(rewrites[4].instruction, ";-- removed [tower skipped] - G1 X105 Y105 E3");
    assert_eq!(rewrites[5].disposition, Disposition::Suppress);
    assert_eq!(rewrites[6].instruction, "G1 X50 Y50 E1");
    assert_eq!(rewrites[6].disposition, Disposition::Emit);
    assert_eq!(
        rewrites[8].instruction,
        ";-- removed [side wipe/full purge] - G1 X105 Y105 E4"
    );
    assert_eq!(rewrites[9].disposition, Disposition::Emit);

    // only the purge of the kept layer is waiting to be wiped
    let ctx = engine.context();
    assert_eq!(ctx.side_wipe_length, 4.0);
    assert!(!ctx.tower_skipped);
    assert_eq!(ctx.splices.total_extruded(), 3.0);
}

#[test]
fn skipped_tower_keeps_single_retract() {
    use BlockClass::*;
    let mut layers = LayerPlan::new();
    layers.start_layer(0, 0, false);
    layers.start_layer(2, 1, false);
    layers.start_layer(9, 2, true);

    let settings = Settings::new();
    let mut diagnostics = Diagnostics::new();
    let mut engine = path_engine(
        &settings,
        &mut diagnostics,
        PurgeStrategy::TowerDelta,
        layers,
        Collaborators::default(),
    );

    let rewrites = feed(
        &mut engine,
        &[
            (";LAYER 0", Normal),
            ("G1 X10 Y10 E1", Normal),
            (";LAYER 1", Normal),
            ("G1 X105 Y105", Empty),
            ("G1 E-0.8 F2100", Empty),
            ("G1 E-0.8 F2100", Empty),
            ("G1 X106 Y106 Z0.6", Empty),
            ("G1 X107 Y107", EndGrid),
            ("G1 X50 Y50 E1", Normal),
        ],
    );

    assert!(rewrites[3]
        .inserted
        .contains(&";  GRID SKIP --TOWER DELTA   0.20mm".to_string()));
    assert_eq!(rewrites[3].instruction, ";-- removed [tower skipped] - G1 X105 Y105");
    assert_eq!(rewrites[4].instruction, "G1 E-0.8 F2100");
    assert_eq!(rewrites[4].disposition, Disposition::Emit);
    assert_eq!(
        rewrites[5].instruction,
        ";-- removed [tower skipped//Double Retract] - G1 E-0.8 F2100"
    );
    assert_eq!(rewrites[6].instruction, "G1 X106 Y106 Z0.6");
    assert_eq!(rewrites[6].disposition, Disposition::Emit);
    assert_eq!(rewrites[7].disposition, Disposition::Suppress);
    assert_eq!(
        rewrites[8].inserted,
        vec![";fixup retracts".to_string(), "G1 E0.8 F2100".to_string()]
    );
    assert_eq!(rewrites[8].instruction, "G1 X50 Y50 E1");

    let ctx = engine.context();
    assert_eq!(ctx.retraction, 0.0);
    assert!(!ctx.tower_skipped);
    assert!((ctx.tower_z_delta - 0.2).abs() < 1e-9);
    assert!((ctx.splices.total_extruded() - 2.0).abs() < 1e-9);
}

#[test]
fn tower_delta_keeps_purge_extrusion_inside_tower() {
    use BlockClass::*;
    let settings = Settings::new();
    let mut diagnostics = Diagnostics::new();
    let mut engine = path_engine(
        &settings,
        &mut diagnostics,
        PurgeStrategy::TowerDelta,
        LayerPlan::new(),
        Collaborators::default(),
    );

    let rewrites = feed(
        &mut engine,
        &[
            ("G1 X105 Y105", ToolPurge),
            ("G1 X110 Y105 E2", ToolPurge),
            ("G1 X150 Y105 E-0.5", ToolPurge),
            ("G1 X112 Y110 F3000", EndPurge),
            ("G1 X50 Y50 E1", Normal),
        ],
    );

    assert_eq!(rewrites[1].instruction, "G1 X110 Y105 E2");
    assert_eq!(rewrites[2].instruction, "G1 X150 Y105");
    assert_eq!(rewrites[2].disposition, Disposition::Emit);
    // the end of the purge stays where the purge left the nozzle
    assert_eq!(rewrites[3].instruction, "G1 F3000");
    assert!(rewrites[3]
        .inserted
        .contains(&";  TOWER DELTA LEAVE".to_string()));
    assert_eq!(rewrites[4].instruction, "G1 X50 Y50 E1");

    let ctx = engine.context();
    assert_eq!(ctx.position.x, 50.0);
    assert_eq!(ctx.retraction, 0.0);
    assert_eq!(ctx.splices.total_extruded(), 3.0);
}

#[test]
fn collected_purge_counts_towards_splice_length() {
    let lines = [
        ";LAYER 0",
        "T0",
        "; CP TOOLCHANGE END",
        "G1 X10 Y10 E150",
        ";LAYER 1",
        "; CP TOOLCHANGE START",
        "T1",
        "; CP TOOLCHANGE WIPE",
        "G1 X12 Y10 E50",
        "; CP TOOLCHANGE END",
        "G1 X20 Y10 E100",
        ";LAYER 2",
    ];

    let configure: [fn(&mut Settings); 2] = [
        |s| s.purge.side_wipe = true,
        |s| s.purge.full_purge_reduction = true,
    ];
    for apply in configure {
        let mut settings = Settings::new();
        apply(&mut settings);
        let output = Pipeline::new(settings).run(&lines).unwrap();
        let report = &output.report;

        assert!(report.strategy.replaces_purge());
        assert!(output
            .lines
            .contains(&";-- removed [side wipe/full purge] - G1 X12 Y10 E50".to_string()));
        assert_eq!(report.splices.len(), 2);
        assert_eq!(report.splices[0].length, 150.0);
        assert_eq!(report.splices[1].length, 300.0);
        assert_eq!(report.total_extruded, 450.0);
        assert_eq!(report.extruded_per_tool.get(&1), Some(&300.0));
        assert!(report.filament_short.is_empty());
    }
}
