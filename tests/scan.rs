use formula1_scanner::{
    ArtworkConfig, ArtworkError, ArtworkFetcher, ConventionId, EpisodeRecord, EventsProvider,
    ExtensionDiscovery, ImageDownloader, PartStacker, ProgressEvent, ScanRequest, Scanner,
    ScannerConfig, SportsEvent, list_directory,
};
use std::cell::Cell;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::rc::Rc;

const GB_RACE: &str = "Formula.1.2023x05.70th-Anniversary-GB.Race.SkyF1HD.1080p";
const MIAMI_SPRINT: &str = "Formula.1.2023x06.Miami.Sprint.SkyF1HD.1080p";
const ABU_DHABI: &str = "01.F1.2024.R24.Abu.Dhabi.Grand.Prix.Drivers.Press.Conference.Sky.Sports.F1.UHD.2160P.mkv";

struct StaticProvider {
    calls: Rc<Cell<usize>>,
}

impl EventsProvider for StaticProvider {
    fn events_for_round(&self, year: u32, round: u32) -> Result<Vec<SportsEvent>, ArtworkError> {
        self.calls.set(self.calls.get() + 1);
        Ok(vec![SportsEvent {
            name: format!("{} Round {} Grand Prix", year, round),
            poster: Some(format!("https://img/{}-{}-poster.jpg", year, round)),
            thumb: Some(format!("https://img/{}-{}-thumb.jpg", year, round)),
        }])
    }
}

struct WritingDownloader;

impl ImageDownloader for WritingDownloader {
    fn download(&self, url: &str, target: &Path) -> Result<u64, ArtworkError> {
        fs::write(target, url).map_err(|e| ArtworkError::WriteFailed {
            path: target.to_path_buf(),
            source: e,
        })?;
        Ok(url.len() as u64)
    }
}

fn touch(path: PathBuf) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    File::create(path).unwrap();
}

fn library() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    touch(dir.path().join("random_clip.mp4"));
    touch(dir.path().join("notes.txt"));
    touch(dir.path().join(GB_RACE).join("01.Race.Build-up.mp4"));
    touch(dir.path().join(GB_RACE).join("02.Race.Session.mp4"));
    touch(dir.path().join(MIAMI_SPRINT).join("01.Sprint.mp4"));
    touch(dir.path().join("Abu Dhabi").join(ABU_DHABI));
    dir
}

fn scanner(calls: Rc<Cell<usize>>) -> Scanner {
    let config = ScannerConfig::default();
    let fetcher = ArtworkFetcher::new(
        Box::new(StaticProvider { calls }),
        Box::new(WritingDownloader),
        &ArtworkConfig::default(),
    );
    Scanner::with_collaborators(
        config,
        Box::new(ExtensionDiscovery::default()),
        Box::new(PartStacker),
        Some(fetcher),
    )
}

fn scan_into(scanner: &Scanner, root: &Path, media: &mut Vec<EpisodeRecord>) -> Vec<ProgressEvent> {
    let listing = list_directory(root).unwrap();
    let request = ScanRequest::new(root, listing.files).with_subdirs(listing.subdirs);

    let mut events = Vec::new();
    scanner
        .scan(request, media, |event| events.push(event))
        .unwrap();
    events
}

fn scan(scanner: &Scanner, root: &Path) -> (Vec<EpisodeRecord>, Vec<ProgressEvent>) {
    let mut media = Vec::new();
    let events = scan_into(scanner, root, &mut media);
    (media, events)
}

fn offline_scanner() -> Scanner {
    Scanner::with_collaborators(
        ScannerConfig {
            download_art: false,
            ..ScannerConfig::default()
        },
        Box::new(ExtensionDiscovery::default()),
        Box::new(PartStacker),
        None,
    )
}

#[test]
fn scan_library_produces_records_in_traversal_order() {
    let dir = library();
    let calls = Rc::new(Cell::new(0));
    let (media, events) = scan(&scanner(calls), dir.path());

    let titles: Vec<_> = media.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(
        titles,
        vec![
            "random_clip",
            "2024x24: Abu Dhabi GP Weekend",
            "2023x05: 70th Anniversary GB 3",
            "2023x05: 70th Anniversary GB 3",
        ]
    );

    let fallback = &media[0];
    assert_eq!((fallback.year, fallback.season, fallback.episode), (2025, 0, 0));

    let weekend = &media[1];
    assert_eq!((weekend.year, weekend.season, weekend.episode), (2024, 24, 1));
    assert_eq!(weekend.description, "Drivers Press Conference");
    assert_eq!(weekend.parts, vec![dir.path().join("Abu Dhabi").join(ABU_DHABI)]);

    let race = &media[3];
    assert_eq!((race.year, race.season, race.episode), (2023, 3, 2));
    assert_eq!(race.parts, vec![dir.path().join(GB_RACE).join("02.Race.Session.mp4")]);

    let skipped: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            ProgressEvent::FileSkipped { path, .. } => Some(path.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(skipped, vec![dir.path().join(MIAMI_SPRINT).join("01.Sprint.mp4")]);

    let conventions: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            ProgressEvent::ConventionMatched { convention, .. } => Some(*convention),
            _ => None,
        })
        .collect();
    assert_eq!(
        conventions,
        vec![
            ConventionId::Fallback,
            ConventionId::Egortech,
            ConventionId::Smcgill1969,
            ConventionId::Smcgill1969,
            ConventionId::Smcgill1969,
        ]
    );

    assert!(matches!(
        events.last(),
        Some(ProgressEvent::Complete { record_count: 4 })
    ));
}

#[test]
fn scan_writes_artwork_once() {
    let dir = library();
    let calls = Rc::new(Cell::new(0));
    let scanner = scanner(calls.clone());

    scan(&scanner, dir.path());

    let gb = dir.path().join(GB_RACE);
    assert_eq!(
        fs::read_to_string(gb.join("poster.jpg")).unwrap(),
        "https://img/2023-5-poster.jpg"
    );
    assert_eq!(
        fs::read_to_string(gb.join("fanart.jpg")).unwrap(),
        "https://img/2023-5-thumb.jpg"
    );
    assert!(gb.join("01.Race.Build-up.jpg").exists());
    assert!(gb.join("02.Race.Session.jpg").exists());
    assert!(dir.path().join("Abu Dhabi").join("poster.jpg").exists());
    // fallback and skipped files get no artwork
    assert!(!dir.path().join("poster.jpg").exists());
    assert!(!dir.path().join(MIAMI_SPRINT).join("poster.jpg").exists());

    let first_scan_calls = calls.get();
    assert!(first_scan_calls > 0);

    let (media, _) = scan(&scanner, dir.path());
    assert_eq!(media.len(), 4);
    assert_eq!(calls.get(), first_scan_calls);
}

#[test]
fn scan_without_artwork_makes_no_lookups() {
    let dir = library();
    let scanner = Scanner::with_collaborators(
        ScannerConfig {
            download_art: false,
            fallback_year: 1999,
            ..ScannerConfig::default()
        },
        Box::new(ExtensionDiscovery::default()),
        Box::new(PartStacker),
        None,
    );

    let (media, _) = scan(&scanner, dir.path());
    assert_eq!(media[0].year, 1999);
    assert!(!dir.path().join(GB_RACE).join("poster.jpg").exists());
}

#[test]
fn scan_keeps_quality_variants_apart() {
    let dir = tempfile::tempdir().unwrap();
    let hd = dir.path().join(GB_RACE);
    let sd = dir
        .path()
        .join("Formula.1.2023x05.70th-Anniversary-GB.Race.SkyF1UHD.SD");
    touch(hd.join("02.Race.Session.mp4"));
    touch(sd.join("02.Race.Session.mp4"));

    let (media, _) = scan(&offline_scanner(), dir.path());

    assert_eq!(media.len(), 2);
    assert_eq!(media[0].title, media[1].title);
    assert_eq!(media[0].parts, vec![hd.join("02.Race.Session.mp4")]);
    assert_eq!(media[1].parts, vec![sd.join("02.Race.Session.mp4")]);
}

#[test]
fn scan_leaves_existing_records_alone() {
    let first = tempfile::tempdir().unwrap();
    let second = tempfile::tempdir().unwrap();
    let uhd = first
        .path()
        .join("07.F1.2024.R01.Bahrain.Grand.Prix.Race.Sky.Sports.F1.UHD.2160p.mkv");
    let fhd = second
        .path()
        .join("07.F1.2024.R01.Bahrain.Grand.Prix.Race.Sky.Sports.F1.UHD.1080p.mkv");
    touch(uhd.clone());
    touch(fhd.clone());

    let scanner = offline_scanner();
    let mut media = Vec::new();
    scan_into(&scanner, first.path(), &mut media);
    let events = scan_into(&scanner, second.path(), &mut media);

    assert_eq!(media.len(), 2);
    assert_eq!(media[0].parts, vec![uhd]);
    assert_eq!(media[1].parts, vec![fhd]);
    assert!(matches!(
        events.last(),
        Some(ProgressEvent::Complete { record_count: 1 })
    ));
}

#[test]
fn scan_stacks_numbered_parts_of_one_directory() {
    let dir = tempfile::tempdir().unwrap();
    let testing = dir.path().join("Testing");
    touch(testing.join("F1.2019.Test.Day.1.part1.mkv"));
    touch(testing.join("F1.2019.Test.Day.1.part2.mkv"));
    touch(testing.join("F1.2019.Test.Day.2.mkv"));

    let (media, _) = scan(&offline_scanner(), dir.path());

    assert_eq!(media.len(), 2);
    assert_eq!(
        media[0].parts,
        vec![
            testing.join("F1.2019.Test.Day.1.part1.mkv"),
            testing.join("F1.2019.Test.Day.1.part2.mkv"),
        ]
    );
    assert_eq!(media[1].parts, vec![testing.join("F1.2019.Test.Day.2.mkv")]);
}

#[test]
fn scan_ignores_videos_outside_the_catch_all() {
    let dir = tempfile::tempdir().unwrap();
    touch(dir.path().join("random_clip.avi"));

    let (media, events) = scan(&offline_scanner(), dir.path());

    assert!(media.is_empty());
    assert!(events
        .iter()
        .all(|e| !matches!(e, ProgressEvent::ConventionMatched { .. })));
}
