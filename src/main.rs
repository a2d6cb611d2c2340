use clap::Parser;
use log::warn;
use std::{
    ops::RangeInclusive,
    path::{Path, PathBuf},
};

use pushbox::{
    Direction, LevelError, LevelSet, Levels, MapDescription, Puzzle, PuzzleConfig, PuzzleListener,
};

/// Listener standing in for the game HUD.
struct Hud {
    verbose: bool,
}

impl PuzzleListener for Hud {
    fn on_steps_changed(&mut self, steps: u32) {
        if self.verbose {
            println!("Steps: {}", steps);
        }
    }

    fn on_level_completed(&mut self) {
        if self.verbose {
            println!("Level completed!");
        }
    }
}

struct LevelStats {
    solved: bool,
    steps: u32,
    pushes: usize,
}

fn parse_moves(moves: &str) -> Result<Vec<Direction>, String> {
    moves
        .chars()
        .filter(|ch| !ch.is_whitespace())
        .map(|ch| Direction::from_char(ch).ok_or_else(|| format!("Invalid move '{}'", ch)))
        .collect()
}

/// Load every map stored in a level file: one for `.json`, the whole
/// collection for `.xsb`.
fn load_maps(path: &Path) -> Result<Vec<MapDescription>, LevelError> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => Ok(vec![MapDescription::from_file(path)?]),
        _ => {
            let levels = Levels::from_file(path)?;
            Ok(levels.iter().cloned().collect())
        }
    }
}

/// Resolve the `--level`/`--level-end` options to a 1-based inclusive range.
/// Without `--level` every level is played; with it alone, just that level.
fn select_levels(
    count: usize,
    level: Option<usize>,
    level_end: Option<usize>,
) -> Result<RangeInclusive<usize>, String> {
    let level_start = level.unwrap_or(1);
    let level_end = level_end.or(level).unwrap_or(count);

    if level_start == 0 {
        return Err("level numbers must be at least 1".to_string());
    }
    if level_end < level_start {
        return Err("level end must be >= level start".to_string());
    }
    if level_end > count {
        return Err(format!(
            "level {} not found (file contains {} levels)",
            level_end, count
        ));
    }
    Ok(level_start..=level_end)
}

fn play_level(
    label: &str,
    map: &MapDescription,
    config: PuzzleConfig,
    moves: &[Direction],
    print: bool,
) -> Result<LevelStats, LevelError> {
    let mut puzzle = Puzzle::load(map, config)?;
    let mut hud = Hud { verbose: print };
    let mut pushes = 0;

    if print {
        println!("\nStarting position:\n{}", puzzle);
    }
    puzzle.notify_steps(&mut hud);
    puzzle.notify_completed(&mut hud);
    for (count, &direction) in moves.iter().enumerate() {
        let outcome = puzzle.attempt_move(direction, &mut hud);
        pushes += outcome.boxes_pushed;
        if print {
            let verb = if outcome.player_moved { "Move" } else { "Blocked" };
            println!(
                "{} {} ({}/{}):\n{}",
                verb,
                direction,
                count + 1,
                moves.len(),
                puzzle
            );
        }
    }

    let placement = puzzle.placement();
    println!(
        "level: {:<12}  solved: {}  steps: {:<5}  pushes: {:<5}  boxes: {}/{}",
        label,
        if puzzle.is_completed() { 'Y' } else { 'N' },
        puzzle.steps(),
        pushes,
        placement.boxes_on_holders(),
        placement.holders().len()
    );

    Ok(LevelStats {
        solved: puzzle.is_completed(),
        steps: puzzle.steps(),
        pushes,
    })
}

#[derive(Parser)]
#[command(name = "pushbox")]
#[command(about = "Replay moves on Sokoban levels", long_about = None)]
struct Args {
    /// Level file (.json map or .xsb collection) or a directory of level files
    #[arg(value_name = "PATH")]
    path: PathBuf,

    /// Level number within an XSB collection (1-indexed), or start of range
    #[arg(short, long, value_name = "N")]
    level: Option<usize>,

    /// Optional end of level range (inclusive, 1-indexed)
    #[arg(long, value_name = "N", requires = "level")]
    level_end: Option<usize>,

    /// Moves to play, in LURD notation (e.g. "rrUld")
    #[arg(short, long, default_value = "")]
    moves: String,

    /// Maximum number of boxes pushed at once (overrides the config file)
    #[arg(short = 'c', long)]
    max_chain: Option<usize>,

    /// JSON file with game rules
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Print the board after every move
    #[arg(short, long)]
    print: bool,
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => PuzzleConfig::from_file(path),
        None => Ok(PuzzleConfig::default()),
    };
    let config = match (config, args.max_chain) {
        (Ok(_), Some(max_chain)) => PuzzleConfig::with_max_chain_len(max_chain),
        (config, _) => config,
    };
    let config = match config {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            std::process::exit(1);
        }
    };

    let moves = match parse_moves(&args.moves) {
        Ok(moves) => moves,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    // Collect (label, map) pairs to play
    let mut levels: Vec<(String, MapDescription)> = Vec::new();
    if args.path.is_dir() {
        if args.level.is_some() {
            warn!("--level is ignored when playing a directory");
        }
        let mut level_set = match LevelSet::from_dir(&args.path) {
            Ok(level_set) => level_set,
            Err(e) => {
                eprintln!("Error reading level directory: {}", e);
                std::process::exit(1);
            }
        };
        let mut current = level_set.current().map(Path::to_path_buf);
        while let Some(path) = current {
            match load_maps(&path) {
                Ok(maps) => {
                    let name = path.file_name().unwrap_or_default().to_string_lossy();
                    for (i, map) in maps.into_iter().enumerate() {
                        levels.push((format!("{}#{}", name, i + 1), map));
                    }
                }
                Err(e) => warn!("Skipping {}: {}", path.display(), e),
            }
            current = level_set.advance().map(Path::to_path_buf);
        }
    } else {
        let maps = match load_maps(&args.path) {
            Ok(maps) => maps,
            Err(e) => {
                eprintln!("Error loading levels: {}", e);
                std::process::exit(1);
            }
        };

        let range = match select_levels(maps.len(), args.level, args.level_end) {
            Ok(range) => range,
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        };

        for (i, map) in maps.into_iter().enumerate() {
            let level_num = i + 1;
            if range.contains(&level_num) {
                levels.push((level_num.to_string(), map));
            }
        }
    }

    let mut total_solved = 0;
    let mut total_steps = 0;
    let mut total_pushes = 0;
    let mut failed = false;

    for (label, map) in &levels {
        match play_level(label, map, config, &moves, args.print) {
            Ok(stats) => {
                if stats.solved {
                    total_solved += 1;
                }
                total_steps += stats.steps;
                total_pushes += stats.pushes;
            }
            Err(e) => {
                eprintln!("Error loading level {}: {}", label, e);
                failed = true;
            }
        }
    }

    // Print summary statistics if multiple levels were played
    if levels.len() > 1 {
        println!("---");
        println!(
            "solved: {:>3}/{:<3}  steps: {:<5}  pushes: {:<5}",
            total_solved,
            levels.len(),
            total_steps,
            total_pushes
        );
    }

    if failed {
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_args() {
        Args::command().debug_assert();

        let args = Args::try_parse_from(["pushbox", "l.xsb", "--level", "1", "-m", "r"]).unwrap();
        assert_eq!(args.path, PathBuf::from("l.xsb"));
        assert_eq!(args.level, Some(1));
        assert_eq!(args.level_end, None);
        assert_eq!(args.moves, "r");

        let args =
            Args::try_parse_from(["pushbox", "l.xsb", "-l", "2", "--level-end", "4", "-c", "3"])
                .unwrap();
        assert_eq!((args.level, args.level_end), (Some(2), Some(4)));
        assert_eq!(args.max_chain, Some(3));

        // Levels are options, not positionals
        assert!(Args::try_parse_from(["pushbox", "l.xsb", "1"]).is_err());
        assert!(Args::try_parse_from(["pushbox", "l.xsb", "--level-end", "2"]).is_err());
    }

    #[test]
    fn test_select_levels() {
        assert_eq!(select_levels(5, None, None), Ok(1..=5));
        assert_eq!(select_levels(5, Some(3), None), Ok(3..=3));
        assert_eq!(select_levels(5, Some(2), Some(4)), Ok(2..=4));
        assert!(select_levels(5, Some(0), None).is_err());
        assert!(select_levels(5, Some(4), Some(2)).is_err());
        assert!(select_levels(5, Some(6), None).is_err());
        assert!(select_levels(5, Some(1), Some(6)).is_err());
    }

    #[test]
    fn test_parse_moves() {
        use Direction::*;
        assert_eq!(parse_moves("rR u\nLd"), Ok(vec![Right, Right, Up, Left, Down]));
        assert!(parse_moves("rx").is_err());
    }
}
