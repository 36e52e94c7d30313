//! Unit tests for chunked line segmentation.

use std::io;

use rstest::rstest;

use super::*;

const SAMPLE: &str = "\n[\"config\",{}]\n\n[\"create\",\"user\",{\"name\":\"ä\"}]\n[\"delete\",\"group\",{}]";

fn byte_lines(input: &[u8], chunk_size: usize) -> Vec<Vec<u8>> {
    split_bytes(input, chunk_size)
        .collect::<Result<_, _>>()
        .expect("in-memory reads cannot fail")
}

fn expected_sample_lines() -> Vec<String> {
    vec![
        String::from("[\"config\",{}]"),
        String::from("[\"create\",\"user\",{\"name\":\"ä\"}]"),
        String::from("[\"delete\",\"group\",{}]"),
    ]
}

/// Reader that fails after yielding its prefix.
struct FailingReader {
    prefix: &'static [u8],
}

impl io::Read for FailingReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.prefix.is_empty() {
            return Err(io::Error::new(io::ErrorKind::ConnectionReset, "peer went away"));
        }
        let count = self.prefix.len().min(buf.len());
        let (head, tail) = self.prefix.split_at(count);
        buf.get_mut(..count)
            .expect("count bounded by buffer length")
            .copy_from_slice(head);
        self.prefix = tail;
        Ok(count)
    }
}

// ---------------------------------------------------------------------------
// Byte splitting
// ---------------------------------------------------------------------------

#[test]
fn splits_and_discards_empty_lines() {
    let lines = byte_lines(b"\nline_1\n\nlong_middle_line_2\nline_3", 8);
    assert_eq!(
        lines,
        vec![
            b"line_1".to_vec(),
            b"long_middle_line_2".to_vec(),
            b"line_3".to_vec()
        ]
    );
}

#[test]
fn output_is_independent_of_chunk_size() {
    let reference = byte_lines(SAMPLE.as_bytes(), DEFAULT_CHUNK_SIZE);
    assert_eq!(reference.len(), 3);

    for chunk_size in 1..=SAMPLE.len() + 1 {
        assert_eq!(
            byte_lines(SAMPLE.as_bytes(), chunk_size),
            reference,
            "chunk size {chunk_size} changed the output"
        );
    }
}

#[rstest]
#[case::terminator_ends_first_chunk(vec!["ab\n", "cd\n"])]
#[case::terminator_starts_second_chunk(vec!["ab", "\ncd"])]
#[case::terminator_alone(vec!["ab", "\n", "cd"])]
#[case::line_spans_three_chunks(vec!["a", "b", "\nc", "d"])]
fn terminators_at_chunk_boundaries_neither_drop_nor_duplicate(#[case] chunks: Vec<&str>) {
    let chunks = chunks
        .into_iter()
        .map(|chunk| Ok::<_, io::Error>(chunk.as_bytes().to_vec()));
    let lines: Vec<Vec<u8>> = split_chunks(chunks, BYTE_TERMINATOR)
        .collect::<Result<_, _>>()
        .expect("infallible chunks");
    assert_eq!(lines, vec![b"ab".to_vec(), b"cd".to_vec()]);
}

#[rstest]
#[case::empty("")]
#[case::only_terminators("\n\n\n")]
fn inputs_without_content_yield_nothing(#[case] input: &str) {
    assert!(byte_lines(input.as_bytes(), 2).is_empty());
}

#[test]
fn trailing_terminator_yields_no_extra_line() {
    assert_eq!(byte_lines(b"a\nb\n", 3), vec![b"a".to_vec(), b"b".to_vec()]);
}

#[test]
fn read_errors_are_yielded_once_then_the_sequence_ends() {
    let mut lines = split_bytes(FailingReader { prefix: b"one\ntw" }, 4);

    assert_eq!(lines.next().map(Result::ok), Some(Some(b"one".to_vec())));
    let error = lines
        .next()
        .expect("error item")
        .expect_err("reader failure surfaces");
    assert_eq!(error.kind(), io::ErrorKind::ConnectionReset);
    assert!(lines.next().is_none());
}

#[test]
fn zero_chunk_size_is_clamped() {
    assert_eq!(byte_lines(b"x\ny", 0), vec![b"x".to_vec(), b"y".to_vec()]);
}

// ---------------------------------------------------------------------------
// Segmenter
// ---------------------------------------------------------------------------

#[test]
fn segmenter_buffers_partial_segment_until_finish() {
    let mut segmenter = Segmenter::new(b'\n');
    let mut ready = VecDeque::new();

    segmenter.feed(b"abc\nde", &mut ready);
    assert_eq!(ready.pop_front(), Some(b"abc".to_vec()));
    assert_eq!(segmenter.pending(), 2);

    segmenter.feed(b"f", &mut ready);
    assert!(ready.is_empty());
    assert_eq!(segmenter.finish(), Some(b"def".to_vec()));
    assert_eq!(segmenter.pending(), 0);
    assert_eq!(segmenter.finish(), None);
}

// ---------------------------------------------------------------------------
// Text splitting
// ---------------------------------------------------------------------------

#[test]
fn text_splitting_matches_byte_splitting() {
    let from_bytes: Vec<String> = byte_lines(SAMPLE.as_bytes(), 5)
        .into_iter()
        .map(|line| String::from_utf8(line).expect("sample is UTF-8"))
        .collect();
    let from_text: Vec<String> = split_text(SAMPLE, 5).collect();

    assert_eq!(from_text, expected_sample_lines());
    assert_eq!(from_bytes, from_text);
}

#[rstest]
#[case(1)]
#[case(2)]
#[case(7)]
#[case(DEFAULT_CHUNK_SIZE)]
fn text_splitting_keeps_multibyte_characters_intact(#[case] chunk_size: usize) {
    let lines: Vec<String> = split_text("ä\nöü\n\nß", chunk_size).collect();
    assert_eq!(lines, vec!["ä", "öü", "ß"]);
}
