//! Access modes of the parser: lazy sequences and folders of documents.

use std::fs;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use libyamlify::{
    parser, Arguments, Decode, DescriptorCache, Error, Field, Parser, Result, State,
    TypeDescriptor,
};
use tempfile::TempDir;

#[derive(Debug, PartialEq)]
struct Grade {
    subject: String,
    classification: i32,
}

impl Decode for Grade {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::record("Grade")
            .field(Field::new::<String>("subject"))
            .field(Field::new::<i32>("classification"))
    }

    fn construct(mut args: Arguments<'_>) -> Result<Self> {
        Ok(Grade {
            subject: args.take("subject")?,
            classification: args.take("classification")?,
        })
    }
}

struct ClassGrades {
    grades: Vec<Grade>,
}

impl ClassGrades {
    fn subjects(&self) -> Vec<&str> {
        self.grades.iter().map(|g| g.subject.as_str()).collect()
    }
}

impl Decode for ClassGrades {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::record("ClassGrades").field(Field::new::<Vec<Grade>>("grades"))
    }

    fn construct(mut args: Arguments<'_>) -> Result<Self> {
        Ok(ClassGrades {
            grades: args.take("grades")?,
        })
    }
}

const GRADES: &str = "\
grades:
  -
    subject: LAE
    classification: 18
  -
    subject: PDM
    classification: 15
  -
    subject: PC
    classification: 19
";

const GRADES_CHANGED: &str = "\
grades:
  -
    subject: PSC
    classification: 10
  -
    subject: PG
    classification: 13
  -
    subject: LIC
    classification: 11
";

fn write(dir: &Path, name: &str, contents: &str) {
    fs::write(dir.join(name), contents).unwrap();
}

fn grades_folder() -> TempDir {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "test.yaml", GRADES);
    write(dir.path(), "test2.yaml", GRADES_CHANGED);
    write(dir.path(), "test3.yaml", GRADES);
    dir
}

/// Reader that records how many bytes have been pulled from it.
struct Counting<'a> {
    inner: &'a [u8],
    read: usize,
}

impl Read for Counting<'_> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        // One byte at a time, so progress is observable
        let n = self.inner.len().min(buf.len()).min(1);
        buf[..n].copy_from_slice(&self.inner[..n]);
        self.inner = &self.inner[n..];
        self.read += n;
        Ok(n)
    }
}

#[test]
fn test_sequence_of_ints() {
    let seq = parser::<i32>().parse_sequence("- 1\n- 2\n- 3\n".as_bytes());
    let values: Vec<i32> = seq.collect::<Result<_>>().unwrap();
    assert_eq!(values, vec![1, 2, 3]);
}

#[test]
fn test_sequence_yields_before_failing() {
    let mut seq = parser::<i32>().parse_sequence("- 1\n- a\n- 3\n".as_bytes());
    assert_eq!(seq.next().unwrap().unwrap(), 1);
    let err = seq.next().unwrap().unwrap_err();
    assert_eq!(
        err.to_string(),
        "Cannot convert \"a\" to i32: invalid digit found in string"
    );
    assert_eq!(seq.state(), State::Exhausted);
    assert!(seq.next().is_none());
}

#[test]
fn test_sequence_collect_fails() {
    let seq = parser::<i32>().parse_sequence("- 1\n- a\n- 3\n".as_bytes());
    assert!(seq.collect::<Result<Vec<_>>>().is_err());
}

#[test]
fn test_sequence_is_exhausted_after_last_item() {
    let mut seq = parser::<String>().parse_sequence("- a\n- b\n".as_bytes());
    assert_eq!(seq.require_next().unwrap(), "a");
    assert_eq!(seq.require_next().unwrap(), "b");
    assert!(matches!(seq.require_next(), Err(Error::EmptyInput(_))));
    assert!(seq.next().is_none());
}

#[test]
fn test_sequence_peek() {
    let mut seq = parser::<u8>().parse_sequence("- 7\n".as_bytes());
    assert_eq!(seq.state(), State::Start);
    assert_eq!(*seq.peek().unwrap().unwrap(), 7);
    assert_eq!(*seq.peek().unwrap().unwrap(), 7);
    assert_eq!(seq.state(), State::ItemReady);
    assert_eq!(seq.next().unwrap().unwrap(), 7);
    assert!(seq.peek().is_none());
    assert_eq!(seq.state(), State::Exhausted);
}

#[test]
fn test_sequence_of_records_reads_lazily() {
    let source = "-\n  subject: LAE\n  classification: 18\n-\n  subject: PDM\n  classification: oops\n";
    let mut counting = Counting {
        inner: source.as_bytes(),
        read: 0,
    };
    {
        let reader = BufReader::with_capacity(1, &mut counting);
        let mut seq = parser::<Grade>().parse_sequence(reader);
        let first = seq.next().unwrap().unwrap();
        assert_eq!(first.subject, "LAE");
        // Dropping the sequence releases the reader
    }
    // The first item is complete once the second marker has been read
    assert!(counting.read < source.len());
}

#[test]
fn test_empty_sequence() {
    let mut seq = parser::<i32>().parse_sequence("\n\n".as_bytes());
    assert!(seq.next().is_none());
    let mut seq = parser::<i32>().parse_sequence("- \n- \n".as_bytes());
    assert!(seq.next().is_none());
}

#[test]
fn test_sequence_structural_error_has_location() {
    let mut seq = parser::<i32>()
        .filename("ints.yaml")
        .parse_sequence("- 1\n- 2\n - 3\n".as_bytes());
    assert_eq!(seq.next().unwrap().unwrap(), 1);
    assert_eq!(seq.next().unwrap().unwrap(), 2);
    let err = seq.next().unwrap().unwrap_err();
    assert_eq!(
        err.to_string(),
        "Invalid indentation (odd indentation inside sequence): \"- 3\" at line 3 of <ints.yaml>"
    );
}

#[test]
fn test_sequence_from_file_lines() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "ints.yaml", "- 10\n\n- 20\n");
    let file = fs::File::open(dir.path().join("ints.yaml")).unwrap();
    let reader: Box<dyn BufRead> = Box::new(BufReader::new(file));
    let values: Vec<i64> = parser::<i64>()
        .parse_sequence(reader)
        .collect::<Result<_>>()
        .unwrap();
    assert_eq!(values, vec![10, 20]);
}

#[test]
fn test_parse_folder_eager() {
    let dir = grades_folder();
    let result = parser::<ClassGrades>()
        .parse_folder_eager(dir.path())
        .unwrap();

    // Already decoded: later changes are not observed
    write(dir.path(), "test2.yaml", GRADES);
    write(dir.path(), "test3.yaml", GRADES_CHANGED);

    assert_eq!(result.len(), 3);
    assert_eq!(result[0].subjects(), vec!["LAE", "PDM", "PC"]);
    assert_eq!(result[0].grades[0].classification, 18);
    assert_eq!(result[1].subjects(), vec!["PSC", "PG", "LIC"]);
    assert_eq!(result[2].subjects(), vec!["LAE", "PDM", "PC"]);
}

#[test]
fn test_parse_folder_lazy() {
    let dir = grades_folder();
    let mut folder = parser::<ClassGrades>()
        .parse_folder_lazy(dir.path())
        .unwrap();
    assert_eq!(folder.len(), 3);

    let first = folder.next().unwrap().unwrap();
    assert_eq!(first.subjects(), vec!["LAE", "PDM", "PC"]);

    // Not yet decoded: changes are observed
    write(dir.path(), "test2.yaml", GRADES);
    write(dir.path(), "test3.yaml", GRADES_CHANGED);

    assert_eq!(folder.remaining().len(), 2);
    let second = folder.next().unwrap().unwrap();
    assert_eq!(second.subjects(), vec!["LAE", "PDM", "PC"]);
    let third = folder.next().unwrap().unwrap();
    assert_eq!(third.subjects(), vec!["PSC", "PG", "LIC"]);
    assert!(folder.next().is_none());
}

#[test]
fn test_folder_skips_other_files() {
    let dir = grades_folder();
    write(dir.path(), "notes.txt", "not a document");
    fs::create_dir(dir.path().join("nested.yaml")).unwrap();
    let result = parser::<ClassGrades>()
        .parse_folder_eager(dir.path())
        .unwrap();
    assert_eq!(result.len(), 3);
}

#[test]
fn test_folder_extension() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "b.yml", "- 2\n");
    write(dir.path(), "a.yml", "- 1\n");
    write(dir.path(), "c.yaml", "- 3\n");
    let result = Parser::<Vec<u8>>::new()
        .extension("yml")
        .parse_folder_eager(dir.path())
        .unwrap();
    assert_eq!(result, vec![vec![1], vec![2]]);
}

#[test]
fn test_folder_error_names_file() {
    let dir = grades_folder();
    write(dir.path(), "test2.yaml", "grades:\n  -\n   subject: LAE\n");
    let mut folder = parser::<ClassGrades>()
        .parse_folder_lazy(dir.path())
        .unwrap();
    assert!(folder.next().unwrap().is_ok());
    let err = folder.next().unwrap().err().unwrap();
    assert_eq!(
        err.to_string(),
        "Invalid indentation (odd indentation inside sequence): \"subject: LAE\" at line 3 of <test2.yaml>"
    );
    assert!(folder.next().unwrap().is_ok());
}

#[test]
fn test_missing_folder() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("absent");
    let err = parser::<ClassGrades>()
        .parse_folder_eager(&missing)
        .err()
        .unwrap();
    assert!(matches!(err, Error::Io(_)));
    assert!(parser::<ClassGrades>().parse_folder_lazy(&missing).is_err());
}

#[test]
fn test_empty_folder() {
    let dir = TempDir::new().unwrap();
    assert!(parser::<ClassGrades>()
        .parse_folder_eager(dir.path())
        .unwrap()
        .is_empty());
}

#[test]
fn test_private_cache() {
    let cache = DescriptorCache::new();
    let p = Parser::<Grade>::with_cache(&cache);
    let grade = p
        .parse_object_str("subject: LAE\nclassification: 18\n")
        .unwrap();
    assert_eq!(
        grade,
        Grade {
            subject: "LAE".to_string(),
            classification: 18
        }
    );
    assert!(cache.contains::<Grade>());
    assert!(cache.contains::<String>());
    assert!(cache.contains::<i32>());
    assert_eq!(cache.len(), 3);
}

#[test]
fn test_private_cache_describes_nested_types() {
    let cache = DescriptorCache::new();
    let class = Parser::<ClassGrades>::with_cache(&cache)
        .parse_object_str(GRADES)
        .unwrap();
    assert_eq!(class.subjects(), vec!["LAE", "PDM", "PC"]);
    assert!(cache.contains::<ClassGrades>());
    assert!(cache.contains::<Vec<Grade>>());
    assert!(cache.contains::<Grade>());
    assert_eq!(cache.len(), 5);
}

#[test]
fn test_list_modes_name_item_type_on_duplicate_key() {
    let source = "-\n  subject: LAE\n  subject: PC\n";
    let expected = "Duplicate key \"subject\" for Grade at line 3";

    let err = parser::<Grade>().parse_list_str(source).unwrap_err();
    assert_eq!(err.to_string(), expected);

    let err = parser::<Grade>()
        .parse_sequence(source.as_bytes())
        .next()
        .unwrap()
        .unwrap_err();
    assert_eq!(err.to_string(), expected);
}
