//! Integration tests for PDU codec round-trips and frame-level behavior

use crate::codec::{Frame, PduHeader, PduRegistry};
use crate::connector::{BindCredentials, BindKind};
use crate::datatypes::*;
use std::io::Cursor;

fn decode_frame(bytes: &[u8], registry: &PduRegistry) -> Frame {
    let mut header_cursor = Cursor::new(bytes);
    let header = PduHeader::decode(&mut header_cursor).expect("valid header");
    let mut body_cursor = Cursor::new(&bytes[PduHeader::SIZE..]);
    registry
        .decode_pdu(header, &mut body_cursor)
        .expect("valid body")
}

#[test]
fn bind_transceiver_round_trips() {
    let registry = PduRegistry::new();
    let bind = BindTransceiver {
        command_status: CommandStatus::Ok,
        sequence_number: 7,
        system_id: SystemId::from("tester"),
        password: Some(Password::from("secret")),
        system_type: SystemType::from(""),
        interface_version: InterfaceVersion::SmppV34,
        addr_ton: TypeOfNumber::International,
        addr_npi: NumericPlanIndicator::Isdn,
        address_range: AddressRange::default(),
    };
    let frame = Frame::BindTransceiver(Box::new(bind));
    let bytes = frame.to_bytes().expect("encodes");
    let decoded = decode_frame(&bytes, &registry);

    match decoded {
        Frame::BindTransceiver(pdu) => {
            assert_eq!(pdu.sequence_number, 7);
            assert_eq!(pdu.system_id.as_str().unwrap(), "tester");
        }
        other => panic!("expected BindTransceiver, got {other:?}"),
    }
}

#[test]
fn submit_sm_round_trips_with_ascii_body() {
    let registry = PduRegistry::new();
    let submit = SubmitSm {
        command_status: CommandStatus::Ok,
        sequence_number: 42,
        service_type: ServiceType::default(),
        source_addr_ton: TypeOfNumber::International,
        source_addr_npi: NumericPlanIndicator::Isdn,
        source_addr: SourceAddr::new("15551234567", TypeOfNumber::International).unwrap(),
        dest_addr_ton: TypeOfNumber::International,
        dest_addr_npi: NumericPlanIndicator::Isdn,
        destination_addr: DestinationAddr::new("15557654321", TypeOfNumber::International)
            .unwrap(),
        esm_class: EsmClass::default(),
        protocol_id: 0,
        priority_flag: 0,
        schedule_delivery_time: ScheduleDeliveryTime::default(),
        validity_period: ValidityPeriod::default(),
        registered_delivery: 1,
        replace_if_present_flag: 0,
        data_coding: DataCoding::default(),
        sm_default_msg_id: 0,
        sm_length: 5,
        short_message: ShortMessage::new(b"hello").unwrap(),
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
    };
    assert!(submit.validate().is_ok());

    let frame = Frame::SubmitSm(Box::new(submit));
    let bytes = frame.to_bytes().expect("encodes");
    let decoded = decode_frame(&bytes, &registry);

    match decoded {
        Frame::SubmitSm(pdu) => {
            assert_eq!(pdu.sequence_number, 42);
            assert_eq!(pdu.short_message.as_bytes(), b"hello");
        }
        other => panic!("expected SubmitSm, got {other:?}"),
    }
}

#[test]
fn enquire_link_has_no_body_and_gets_a_response() {
    let frame = Frame::EnquireLink(EnquireLink::new(3));
    assert!(frame.can_response());
    let resp = frame.get_response().expect("enquire_link responds");
    match resp {
        Frame::EnquireLinkResp(r) => assert_eq!(r.sequence_number, 3),
        other => panic!("expected EnquireLinkResp, got {other:?}"),
    }
}

#[test]
fn unbind_gets_matching_response() {
    let frame = Frame::Unbind(Unbind {
        command_status: CommandStatus::Ok,
        sequence_number: 9,
    });
    assert!(frame.can_response());
    let resp = frame.get_response().expect("unbind responds");
    assert!(matches!(resp, Frame::UnbindResp(_)));
    assert_eq!(resp.sequence_number(), 9);
}

#[test]
fn response_pdus_cannot_respond_again() {
    let resp = Frame::EnquireLinkResp(EnquireLinkResponse::new(1));
    assert!(resp.is_response());
    assert!(!resp.can_response());
    assert!(resp.get_response().is_none());
}

#[test]
fn set_sequence_number_overwrites_every_variant() {
    let mut frame = Frame::EnquireLink(EnquireLink::new(1));
    frame.set_sequence_number(99);
    assert_eq!(frame.sequence_number(), 99);

    let mut frame = Frame::SubmitSmResp(SubmitSmResponse::new(1, "abc"));
    frame.set_sequence_number(55);
    assert_eq!(frame.sequence_number(), 55);
}

#[test]
fn deliver_sm_resp_marshals_to_exact_bytes() {
    let frame = Frame::DeliverSm(Box::new(DeliverSm {
        command_status: CommandStatus::Ok,
        sequence_number: 13,
        service_type: ServiceType::default(),
        source_addr_ton: TypeOfNumber::Unknown,
        source_addr_npi: NumericPlanIndicator::Unknown,
        source_addr: SourceAddr::default(),
        dest_addr_ton: TypeOfNumber::Unknown,
        dest_addr_npi: NumericPlanIndicator::Unknown,
        destination_addr: DestinationAddr::default(),
        esm_class: EsmClass::default(),
        protocol_id: 0,
        priority_flag: 0,
        schedule_delivery_time: ScheduleDeliveryTime::default(),
        validity_period: ValidityPeriod::default(),
        registered_delivery: 0,
        replace_if_present_flag: 0,
        data_coding: DataCoding::default(),
        sm_default_msg_id: 0,
        sm_length: 0,
        short_message: ShortMessage::default(),
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
    }));

    let resp = frame.get_response().expect("deliver_sm responds");
    let bytes = resp.to_bytes().expect("encodes");

    // command_length=0x11 (17), command_id=DELIVER_SM_RESP, status=0, seq=13, message_id="" (single 0x00)
    assert_eq!(
        bytes.as_ref(),
        &[
            0x00, 0x00, 0x00, 0x11, 0x80, 0x00, 0x00, 0x05, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            0x00, 0x0D, 0x00,
        ]
    );
}

#[test]
fn deliver_sm_with_ucs2_message_marshals_to_exact_bytes() {
    let text = "nghắ nghiêng nghiễng ngả";
    let message_bytes: Vec<u8> = text
        .encode_utf16()
        .flat_map(|unit| unit.to_be_bytes())
        .collect();
    assert_eq!(message_bytes.len(), 48);

    let deliver_sm = DeliverSm {
        command_status: CommandStatus::Ok,
        sequence_number: 13,
        service_type: ServiceType::new("abc").unwrap(),
        source_addr_ton: TypeOfNumber::International,
        source_addr_npi: NumericPlanIndicator::Isdn,
        source_addr: SourceAddr::from("Alicer"),
        dest_addr_ton: TypeOfNumber::National,
        dest_addr_npi: NumericPlanIndicator::National,
        destination_addr: DestinationAddr::from("Bobo"),
        esm_class: EsmClass::default(),
        protocol_id: 99,
        priority_flag: 61,
        schedule_delivery_time: ScheduleDeliveryTime::default(),
        validity_period: ValidityPeriod::default(),
        registered_delivery: 83,
        replace_if_present_flag: 0,
        data_coding: DataCoding::Ucs2,
        sm_default_msg_id: 0,
        sm_length: message_bytes.len() as u8,
        short_message: ShortMessage::new(&message_bytes).unwrap(),
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
    };

    let bytes = Frame::DeliverSm(Box::new(deliver_sm)).to_bytes().expect("encodes");

    let mut expected = Vec::new();
    expected.extend_from_slice(&[0x00, 0x00, 0x00, 0x5E]); // command_length = 94
    expected.extend_from_slice(&[0x00, 0x00, 0x00, 0x05]); // command_id = DELIVER_SM
    expected.extend_from_slice(&[0x00, 0x00, 0x00, 0x00]); // command_status
    expected.extend_from_slice(&[0x00, 0x00, 0x00, 0x0D]); // sequence_number = 13
    expected.extend_from_slice(b"abc\0"); // service_type
    expected.push(1); // source_addr_ton = International
    expected.push(1); // source_addr_npi = Isdn
    expected.extend_from_slice(b"Alicer\0");
    expected.push(2); // dest_addr_ton = National
    expected.push(8); // dest_addr_npi = National
    expected.extend_from_slice(b"Bobo\0");
    expected.push(0); // esm_class
    expected.push(99); // protocol_id
    expected.push(61); // priority_flag
    expected.push(0); // schedule_delivery_time (empty C-string)
    expected.push(0); // validity_period (empty C-string)
    expected.push(83); // registered_delivery
    expected.push(0); // replace_if_present_flag
    expected.push(0x08); // data_coding = UCS2BE
    expected.push(0); // sm_default_msg_id
    expected.push(48); // sm_length
    expected.extend_from_slice(&message_bytes);

    assert_eq!(bytes.as_ref(), expected.as_slice());
}

#[test]
fn enquire_link_marshals_to_exact_bytes_and_response() {
    let frame = Frame::EnquireLink(EnquireLink::new(13));
    let bytes = frame.to_bytes().expect("encodes");
    assert_eq!(
        bytes.as_ref(),
        &[0x00, 0x00, 0x00, 0x10, 0x00, 0x00, 0x00, 0x15, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            0x00, 0x0D]
    );

    let resp_bytes = frame
        .get_response()
        .expect("enquire_link responds")
        .to_bytes()
        .expect("encodes");
    assert_eq!(
        resp_bytes.as_ref(),
        &[0x00, 0x00, 0x00, 0x10, 0x80, 0x00, 0x00, 0x15, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            0x00, 0x0D]
    );
}

#[test]
fn bind_credentials_builder_sets_kind_and_system_type() {
    let creds = BindCredentials::new("sys", "pw")
        .system_type("VMA")
        .bind_kind(BindKind::Receiver);
    assert_eq!(creds.system_id, "sys");
    assert_eq!(creds.system_type, "VMA");
    assert_eq!(creds.bind_kind, BindKind::Receiver);
}
