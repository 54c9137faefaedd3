//! End-to-end flow through the public API: load a CSV light curve, place
//! markers with the pointer, fold, save, and find the entry again after
//! reopening the same data under another name.

use std::fs;
use std::path::Path;

use approx::assert_abs_diff_eq;
use tempfile::TempDir;
use transit_core::{MarkerPhase, Session, TransitConfig, TransitError};

/// Flat light curve over days 0..=100 with a 2% dip every 10 days from day 5.
fn write_light_curve(path: &Path) {
    let mut text = String::from("time,flux\n");
    for i in 0..=1000 {
        let t = i as f64 * 0.1;
        let phase = (t - 5.0).rem_euclid(10.0);
        let flux = if phase < 0.15 || phase > 9.85 { 980.0 } else { 1000.0 };
        text.push_str(&format!("{t},{flux}\n"));
    }
    text.push_str("100.1,NaN\n");
    fs::write(path, text).unwrap();
}

fn session(dir: &TempDir) -> Session {
    Session::new(TransitConfig {
        cache_dir: dir.path().join("cache"),
        ..TransitConfig::default()
    })
}

#[test]
fn test_mark_fold_save_and_reopen() {
    let dir = TempDir::new().unwrap();
    let first_path = dir.path().join("kplr011446443-2009131105131_llc.csv");
    write_light_curve(&first_path);

    let mut session = session(&dir);
    session.open_path(&first_path).unwrap();

    let series = session.series().unwrap();
    assert_eq!(series.len(), 1001);
    assert_eq!(series.identifier(), "011446443");
    assert_eq!(series.bounds(), (0.0, 100.0));

    // Place the first transit, then drag out the period.
    session.pointer_moved(5.003);
    session.clicked();
    session.pointer_moved(15.0);
    assert_eq!(
        session.markers().unwrap().phase(),
        MarkerPhase::SecondPending
    );
    session.clicked();

    let markers = session.markers().unwrap();
    assert_eq!(markers.fold_params(), Some((5.0, 10.0)));
    assert_eq!(markers.repeats().left.len(), 0);
    assert_eq!(markers.repeats().right.len(), 9);

    // Folding stacks every dip at zero.
    session.toggle_fold().unwrap();
    let frame = session.frame().unwrap();
    assert!(frame.folded);
    assert_eq!(frame.title.as_deref(), Some("Kepler ID - 011446443"));
    for (x, y) in frame.x.iter().zip(&frame.y) {
        assert!(x.abs() <= 5.0 + 1e-9);
        if *y < 0.99 {
            assert!(x.abs() < 0.2, "dip at folded time {x}");
        }
    }

    session.save_candidate().unwrap();
    session.close().unwrap();

    // Same bytes, different name: same catalog.
    let copy_path = dir.path().join("renamed.csv");
    fs::copy(&first_path, &copy_path).unwrap();
    session.open_path(&copy_path).unwrap();
    assert_eq!(session.series().unwrap().identifier(), "");

    let entry = *session.catalog().unwrap().get(0).unwrap();
    assert_abs_diff_eq!(entry.epoch, 5.0);
    assert_eq!(entry.period, Some(10.0));

    session.load_entry(0).unwrap();
    assert_eq!(session.markers().unwrap().phase(), MarkerPhase::BothPlaced);
}

#[test]
fn test_detrended_constant_series() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("flat.csv");
    fs::write(&path, "1,1\n2,1\n3,1\n4,1\n5,1\n6,1\n7,1\n8,1\n9,1\n").unwrap();

    let mut session = session(&dir);
    session.open_path(&path).unwrap();
    session.set_detrend(true).unwrap();

    assert_eq!(session.frame().unwrap().y, vec![1.0; 9]);
}

#[test]
fn test_empty_file_is_empty_series() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("empty.csv");
    fs::write(&path, "time,flux\n1,NaN\n2,inf\n").unwrap();

    let mut session = session(&dir);
    assert!(matches!(
        session.open_path(&path),
        Err(TransitError::EmptySeries)
    ));
    assert!(!session.is_loaded());
}
