// ABOUTME: Comprehensive benchmark suite for SMPP library performance testing
// ABOUTME: Measures header decode, frame decode, and serialization across PDU types

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use smpp::codec::{Encodable, Frame, PduHeader, PduRegistry};
use smpp::datatypes::*;
use std::io::Cursor;
use std::time::Duration;

fn sample_submit_sm(message: &str) -> Box<SubmitSm> {
    Box::new(SubmitSm {
        command_status: CommandStatus::Ok,
        sequence_number: 1,
        service_type: ServiceType::default(),
        source_addr_ton: TypeOfNumber::International,
        source_addr_npi: NumericPlanIndicator::Isdn,
        source_addr: SourceAddr::new("12345", TypeOfNumber::International).unwrap(),
        dest_addr_ton: TypeOfNumber::International,
        dest_addr_npi: NumericPlanIndicator::Isdn,
        destination_addr: DestinationAddr::new("67890", TypeOfNumber::International).unwrap(),
        esm_class: EsmClass::default(),
        protocol_id: 0,
        priority_flag: 0,
        schedule_delivery_time: ScheduleDeliveryTime::default(),
        validity_period: ValidityPeriod::default(),
        registered_delivery: 0,
        replace_if_present_flag: 0,
        data_coding: DataCoding::default(),
        sm_default_msg_id: 0,
        sm_length: message.len() as u8,
        short_message: ShortMessage::new(message.as_bytes()).unwrap(),
        user_message_reference: None,
        source_port: None,
        destination_port: None,
        sar_msg_ref_num: None,
        sar_total_segments: None,
        sar_segment_seqnum: None,
        user_data_header: None,
        privacy_indicator: None,
        callback_num: None,
        source_subaddress: None,
        dest_subaddress: None,
        language_indicator: None,
        its_session_info: None,
        message_payload: None,
    })
}

fn sample_deliver_sm() -> Box<DeliverSm> {
    Box::new(DeliverSm {
        command_status: CommandStatus::Ok,
        sequence_number: 1,
        service_type: ServiceType::default(),
        source_addr_ton: TypeOfNumber::International,
        source_addr_npi: NumericPlanIndicator::Isdn,
        source_addr: SourceAddr::new("12345", TypeOfNumber::International).unwrap(),
        dest_addr_ton: TypeOfNumber::International,
        dest_addr_npi: NumericPlanIndicator::Isdn,
        destination_addr: DestinationAddr::new("67890", TypeOfNumber::International).unwrap(),
        esm_class: EsmClass::default(),
        protocol_id: 0,
        priority_flag: 0,
        schedule_delivery_time: ScheduleDeliveryTime::default(),
        validity_period: ValidityPeriod::default(),
        registered_delivery: 0,
        replace_if_present_flag: 0,
        data_coding: DataCoding::default(),
        sm_default_msg_id: 0,
        sm_length: 11,
        short_message: ShortMessage::new(b"Hello World").unwrap(),
        user_message_reference: None,
        source_port: None,
        destination_port: None,
        sar_msg_ref_num: None,
        sar_total_segments: None,
        sar_segment_seqnum: None,
        user_data_header: None,
        privacy_indicator: None,
        callback_num: None,
        source_subaddress: None,
        dest_subaddress: None,
        language_indicator: None,
        its_session_info: None,
        network_error_code: None,
        message_payload: None,
    })
}

fn sample_bind_transmitter() -> Box<BindTransmitter> {
    Box::new(BindTransmitter {
        command_status: CommandStatus::Ok,
        sequence_number: 1,
        system_id: SystemId::from("test_system"),
        password: Some(Password::from("password")),
        system_type: SystemType::from(""),
        interface_version: InterfaceVersion::SmppV34,
        addr_ton: TypeOfNumber::Unknown,
        addr_npi: NumericPlanIndicator::Unknown,
        address_range: AddressRange::default(),
    })
}

fn decode(bytes: &[u8], registry: &PduRegistry) -> Frame {
    let mut header_cursor = Cursor::new(bytes);
    let header = PduHeader::decode(&mut header_cursor).unwrap();
    let mut body_cursor = Cursor::new(&bytes[PduHeader::SIZE..]);
    registry.decode_pdu(header, &mut body_cursor).unwrap()
}

fn bench_header_decode(c: &mut Criterion) {
    let frame = Frame::SubmitSm(sample_submit_sm("Hello World"));
    let bytes = frame.to_bytes().unwrap();

    let mut group = c.benchmark_group("header_decode");
    group.measurement_time(Duration::from_secs(10));
    group.bench_function("submit_sm", |b| {
        b.iter(|| {
            let mut cursor = Cursor::new(black_box(bytes.as_ref()));
            PduHeader::decode(&mut cursor)
        })
    });
    group.finish();
}

fn bench_frame_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("frame_decode");
    group.measurement_time(Duration::from_secs(10));
    let registry = PduRegistry::new();

    let submit_bytes = Frame::SubmitSm(sample_submit_sm("Hello World"))
        .to_bytes()
        .unwrap();
    group.bench_function("submit_sm", |b| {
        b.iter(|| decode(black_box(&submit_bytes), &registry))
    });

    let deliver_bytes = Frame::DeliverSm(sample_deliver_sm()).to_bytes().unwrap();
    group.bench_function("deliver_sm", |b| {
        b.iter(|| decode(black_box(&deliver_bytes), &registry))
    });

    let bind_bytes = Frame::BindTransmitter(sample_bind_transmitter())
        .to_bytes()
        .unwrap();
    group.bench_function("bind_transmitter", |b| {
        b.iter(|| decode(black_box(&bind_bytes), &registry))
    });

    let enquire_bytes = Frame::EnquireLink(EnquireLink::new(1)).to_bytes().unwrap();
    group.bench_function("enquire_link", |b| {
        b.iter(|| decode(black_box(&enquire_bytes), &registry))
    });

    group.finish();
}

fn bench_serialization(c: &mut Criterion) {
    let mut group = c.benchmark_group("serialization");
    group.measurement_time(Duration::from_secs(10));

    let submit = Frame::SubmitSm(sample_submit_sm("Hello World"));
    group.bench_function("submit_sm", |b| b.iter(|| black_box(&submit).to_bytes()));

    let deliver = Frame::DeliverSm(sample_deliver_sm());
    group.bench_function("deliver_sm", |b| b.iter(|| black_box(&deliver).to_bytes()));

    let bind = Frame::BindTransmitter(sample_bind_transmitter());
    group.bench_function("bind_transmitter", |b| b.iter(|| black_box(&bind).to_bytes()));

    let enquire = Frame::EnquireLink(EnquireLink::new(1));
    group.bench_function("enquire_link", |b| b.iter(|| black_box(&enquire).to_bytes()));

    group.finish();
}

fn bench_roundtrip(c: &mut Criterion) {
    let mut group = c.benchmark_group("roundtrip");
    group.measurement_time(Duration::from_secs(10));
    let registry = PduRegistry::new();

    group.bench_function("submit_sm", |b| {
        b.iter(|| {
            let frame = Frame::SubmitSm(sample_submit_sm("Hello World"));
            let bytes = black_box(&frame).to_bytes().unwrap();
            decode(&bytes, &registry)
        })
    });

    group.bench_function("enquire_link", |b| {
        b.iter(|| {
            let frame = Frame::EnquireLink(EnquireLink::new(1));
            let bytes = black_box(&frame).to_bytes().unwrap();
            decode(&bytes, &registry)
        })
    });

    group.finish();
}

fn bench_message_sizes(c: &mut Criterion) {
    let mut group = c.benchmark_group("message_sizes");
    group.measurement_time(Duration::from_secs(10));
    let registry = PduRegistry::new();

    for &size in &[10usize, 50, 100, 160, 254] {
        let message = "A".repeat(size);
        let frame_bytes = Frame::SubmitSm(sample_submit_sm(&message))
            .to_bytes()
            .unwrap();

        group.bench_with_input(
            BenchmarkId::new("submit_sm_decode", size),
            &frame_bytes,
            |b, frame_bytes| b.iter(|| decode(black_box(frame_bytes), &registry)),
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_header_decode,
    bench_frame_decode,
    bench_serialization,
    bench_roundtrip,
    bench_message_sizes,
);
criterion_main!(benches);
