//! Crate-level integration and BDD tests.

use serde_json::{Value, json};

use crate::decoder::decode_string;
use crate::encoder::to_string;
use crate::entry::BulkApi;
use crate::error::BulkError;
use crate::executor::{AutomaticReportExecutor, ExecutorRegistry};
use crate::model::{
    Body, Command, CommandResult, Configuration, CorrelationId, Operation, Resource,
    ResultStatus,
};
use crate::observer::TracingObserver;
use crate::splitter::split_text;


/// Two-line request used by the protocol walkthrough.
const SAMPLE_BODY: &str = "[\"config\",{}]\n[\"create\",\"user\",{\"name\":\"a\"}]\n";

#[test]
fn sample_request_yields_ordered_success_records() {
    let records: Vec<CommandResult> = BulkApi::new(&AutomaticReportExecutor)
        .with_observer(&TracingObserver)
        .process(decode_string(SAMPLE_BODY))
        .collect::<Result<_, _>>()
        .expect("batch succeeds");

    assert_eq!(records.len(), 2);
    for (position, record) in records.iter().enumerate() {
        assert_eq!(record.id(), CorrelationId::new(position));
        assert_eq!(record.status(), ResultStatus::Success);
    }
}

#[test]
fn encoded_commands_reassemble_into_the_same_batch() {
    let commands = vec![
        Command::new(
            CorrelationId::new(0),
            Operation::Configure(Configuration::new().with_total_instructions(2)),
        )
        .expect("valid configuration"),
        Command::new(
            CorrelationId::new(1),
            Operation::Create(Resource::new(
                "user",
                Body::default().with_anchor("u1"),
            )),
        )
        .expect("valid create"),
        Command::new(
            CorrelationId::new(2),
            Operation::Update(Resource::new(
                "group",
                Body::default().with_relationship("owner", json!("u1")),
            )),
        )
        .expect("valid update"),
    ];

    let text = to_string(&commands).expect("encode");
    let lines: Vec<String> = split_text(&text, 5).collect();
    assert_eq!(lines.len(), commands.len());

    let decoded: Vec<Command> = decode_string(&text)
        .collect::<Result<_, _>>()
        .expect("decode");
    let raws: Vec<&Value> = decoded.iter().map(Command::raw).collect();
    let expected: Vec<&Value> = commands.iter().map(Command::raw).collect();
    assert_eq!(raws, expected);
    assert_eq!(decoded, commands);
}

#[test]
fn malformed_line_is_reported_by_position() {
    let body = "[\"config\",{}]\n\n[\"create\",\"user\",{}]\nnot json\n";
    let outcome: Result<Vec<Vec<u8>>, BulkError> = BulkApi::new(&AutomaticReportExecutor)
        .run_string(body)
        .collect();

    let error = outcome.expect_err("third line is malformed");
    assert!(matches!(error, BulkError::MalformedJson { position: 2, .. }));
    assert_eq!(error.http_status(), 400);
}

#[test]
fn unknown_executor_is_rejected_before_input_is_read() {
    struct Untouched;

    impl std::io::Read for Untouched {
        fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
            panic!("input must not be read");
        }
    }

    let registry = ExecutorRegistry::with_defaults();
    let outcome = BulkApi::from_registry(&registry, "missing")
        .map(|api| api.run_byte_stream(Untouched).count());
    assert!(matches!(outcome, Err(BulkError::ContractViolation { .. })));
}
