use crate::codec::{
    CodecError, Decodable, Encodable, PduHeader, decode_cstring, decode_u8, encode_cstring,
    encode_u8,
};
use crate::datatypes::numeric_plan_indicator::NumericPlanIndicator;
use crate::datatypes::tlv::{Tlv, tags};
use crate::datatypes::{
    CommandId, CommandStatus, DataCoding, DestinationAddr, EsmClass, MessageId,
    ScheduleDeliveryTime, ServiceType, ShortMessage, SourceAddr, TypeOfNumber, ValidityPeriod,
};
use bytes::{Buf, BytesMut};
use std::io::Cursor;

/// This operation is used by an ESME to submit a short message to the SMSC for onward
/// transmission to a specified short message entity (SME). The submit_sm PDU does not
/// support the transaction message mode.
#[derive(Clone, Debug, PartialEq)]
pub struct SubmitSm {
    // pub command_length: u32,
    // pub command_id: CommandId::SubmitSm,
    pub command_status: CommandStatus,
    pub sequence_number: u32,

    // Mandatory parameters
    pub service_type: ServiceType,
    pub source_addr_ton: TypeOfNumber,
    pub source_addr_npi: NumericPlanIndicator,
    pub source_addr: SourceAddr,
    pub dest_addr_ton: TypeOfNumber,
    pub dest_addr_npi: NumericPlanIndicator,
    pub destination_addr: DestinationAddr,
    pub esm_class: EsmClass,
    pub protocol_id: u8,
    pub priority_flag: u8,
    pub schedule_delivery_time: ScheduleDeliveryTime,
    pub validity_period: ValidityPeriod,
    pub registered_delivery: u8,
    pub replace_if_present_flag: u8,
    pub data_coding: DataCoding,
    pub sm_default_msg_id: u8,
    pub sm_length: u8,
    pub short_message: ShortMessage,

    // Optional parameters (TLV format)
    pub user_message_reference: Option<Tlv>,
    pub source_port: Option<Tlv>,
    pub destination_port: Option<Tlv>,
    pub sar_msg_ref_num: Option<Tlv>,
    pub sar_total_segments: Option<Tlv>,
    pub sar_segment_seqnum: Option<Tlv>,
    pub user_data_header: Option<Tlv>,
    pub privacy_indicator: Option<Tlv>,
    pub callback_num: Option<Tlv>,
    pub source_subaddress: Option<Tlv>,
    pub dest_subaddress: Option<Tlv>,
    pub language_indicator: Option<Tlv>,
    pub its_session_info: Option<Tlv>,
    pub message_payload: Option<Tlv>,
}

#[derive(Debug, thiserror::Error)]
pub enum SubmitSmValidationError {
    #[error("sm_length ({sm_length}) does not match short_message length ({message_length})")]
    SmLengthMismatch {
        sm_length: u8,
        message_length: usize,
    },

    #[error("Cannot use both short_message and message_payload - they are mutually exclusive")]
    MutualExclusivityViolation,
}

impl SubmitSm {
    /// Validates sm_length against the actual short_message length, and that
    /// short_message and message_payload aren't both set.
    pub fn validate(&self) -> Result<(), SubmitSmValidationError> {
        if self.sm_length as usize != self.short_message.len() as usize {
            return Err(SubmitSmValidationError::SmLengthMismatch {
                sm_length: self.sm_length,
                message_length: self.short_message.len() as usize,
            });
        }

        if !self.short_message.is_empty() && self.message_payload.is_some() {
            return Err(SubmitSmValidationError::MutualExclusivityViolation);
        }

        Ok(())
    }

    pub fn builder() -> SubmitSmBuilder {
        SubmitSmBuilder::new()
    }
}

/// Builder for creating SubmitSm PDUs with sensible defaults.
pub struct SubmitSmBuilder {
    sequence_number: u32,
    service_type: ServiceType,
    source_addr_ton: TypeOfNumber,
    source_addr_npi: NumericPlanIndicator,
    source_addr: SourceAddr,
    dest_addr_ton: TypeOfNumber,
    dest_addr_npi: NumericPlanIndicator,
    destination_addr: DestinationAddr,
    esm_class: EsmClass,
    protocol_id: u8,
    priority_flag: u8,
    registered_delivery: u8,
    data_coding: DataCoding,
    short_message: ShortMessage,
    message_payload: Option<Tlv>,
}

impl Default for SubmitSmBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SubmitSmBuilder {
    pub fn new() -> Self {
        Self {
            sequence_number: 1,
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
            registered_delivery: 0,
            data_coding: DataCoding::default(),
            short_message: ShortMessage::default(),
            message_payload: None,
        }
    }

    pub fn sequence_number(mut self, seq: u32) -> Self {
        self.sequence_number = seq;
        self
    }

    pub fn source_addr(mut self, addr: &str) -> Self {
        self.source_addr = SourceAddr::new(addr, TypeOfNumber::Unknown).unwrap_or_default();
        self
    }

    pub fn destination_addr(mut self, addr: &str) -> Self {
        self.destination_addr =
            DestinationAddr::new(addr, TypeOfNumber::Unknown).unwrap_or_default();
        self
    }

    pub fn short_message(mut self, message: &str) -> Self {
        self.short_message = ShortMessage::from(message);
        self
    }

    pub fn registered_delivery(mut self, value: u8) -> Self {
        self.registered_delivery = value;
        self
    }

    pub fn data_coding(mut self, data_coding: DataCoding) -> Self {
        self.data_coding = data_coding;
        self
    }

    pub fn message_payload(mut self, tlv: Tlv) -> Self {
        self.message_payload = Some(tlv);
        self
    }

    /// Builds the SubmitSm, auto-calculating sm_length from short_message.
    pub fn build(self) -> Result<SubmitSm, SubmitSmValidationError> {
        let sm_length = self.short_message.len();

        let submit_sm = SubmitSm {
            command_status: CommandStatus::Ok,
            sequence_number: self.sequence_number,
            service_type: self.service_type,
            source_addr_ton: self.source_addr_ton,
            source_addr_npi: self.source_addr_npi,
            source_addr: self.source_addr,
            dest_addr_ton: self.dest_addr_ton,
            dest_addr_npi: self.dest_addr_npi,
            destination_addr: self.destination_addr,
            esm_class: self.esm_class,
            protocol_id: self.protocol_id,
            priority_flag: self.priority_flag,
            schedule_delivery_time: ScheduleDeliveryTime::default(),
            validity_period: ValidityPeriod::default(),
            registered_delivery: self.registered_delivery,
            replace_if_present_flag: 0,
            data_coding: self.data_coding,
            sm_default_msg_id: 0,
            sm_length,
            short_message: self.short_message,
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
            message_payload: self.message_payload,
        };

        submit_sm.validate()?;
        Ok(submit_sm)
    }
}

/// The submit_sm_resp PDU is used to provide a response to the submit_sm request.
#[derive(Clone, Debug, PartialEq)]
pub struct SubmitSmResponse {
    // pub command_length: u32,
    // pub command_id: CommandId::SubmitSmResp,
    pub command_status: CommandStatus,
    pub sequence_number: u32,

    // Body
    /// 4.4.1 message_id: This field contains the SMSC message_id of the
    ///       submitted message. Only used when command_status is Ok.
    pub message_id: MessageId,
}

impl Decodable for SubmitSm {
    fn command_id() -> CommandId {
        CommandId::SubmitSm
    }

    fn decode(header: PduHeader, buf: &mut Cursor<&[u8]>) -> Result<Self, CodecError> {
        Self::validate_header(&header)?;

        let service_type = ServiceType::from_parsed_string(decode_cstring(buf, 6, "service_type")?)
            .map_err(|e| CodecError::FieldValidation {
                field: "service_type",
                reason: e.to_string(),
            })?;
        let source_addr_ton =
            TypeOfNumber::try_from(decode_u8(buf)?).map_err(|_| CodecError::FieldValidation {
                field: "source_addr_ton",
                reason: "Invalid type of number".to_string(),
            })?;
        let source_addr_npi = NumericPlanIndicator::try_from(decode_u8(buf)?).map_err(|_| {
            CodecError::FieldValidation {
                field: "source_addr_npi",
                reason: "Invalid numbering plan indicator".to_string(),
            }
        })?;
        let source_addr = SourceAddr::from_parsed_string(decode_cstring(buf, 21, "source_addr")?)
            .map_err(|e| CodecError::FieldValidation {
                field: "source_addr",
                reason: e.to_string(),
            })?;
        let dest_addr_ton =
            TypeOfNumber::try_from(decode_u8(buf)?).map_err(|_| CodecError::FieldValidation {
                field: "dest_addr_ton",
                reason: "Invalid type of number".to_string(),
            })?;
        let dest_addr_npi = NumericPlanIndicator::try_from(decode_u8(buf)?).map_err(|_| {
            CodecError::FieldValidation {
                field: "dest_addr_npi",
                reason: "Invalid numbering plan indicator".to_string(),
            }
        })?;
        let destination_addr =
            DestinationAddr::from_parsed_string(decode_cstring(buf, 21, "destination_addr")?)
                .map_err(|e| CodecError::FieldValidation {
                    field: "destination_addr",
                    reason: e.to_string(),
                })?;
        let esm_class =
            EsmClass::from_byte(decode_u8(buf)?).map_err(|e| CodecError::FieldValidation {
                field: "esm_class",
                reason: e.to_string(),
            })?;
        let protocol_id = decode_u8(buf)?;
        let priority_flag = decode_u8(buf)?;
        let schedule_delivery_time = ScheduleDeliveryTime::from_parsed_string(decode_cstring(
            buf,
            17,
            "schedule_delivery_time",
        )?)
        .map_err(|e| CodecError::FieldValidation {
            field: "schedule_delivery_time",
            reason: e.to_string(),
        })?;
        let validity_period =
            ValidityPeriod::from_parsed_string(decode_cstring(buf, 17, "validity_period")?)
                .map_err(|e| CodecError::FieldValidation {
                    field: "validity_period",
                    reason: e.to_string(),
                })?;
        let registered_delivery = decode_u8(buf)?;
        let replace_if_present_flag = decode_u8(buf)?;
        let data_coding = DataCoding::from_byte(decode_u8(buf)?);
        let sm_default_msg_id = decode_u8(buf)?;
        let sm_length = decode_u8(buf)?;

        if buf.remaining() < sm_length as usize {
            return Err(CodecError::Incomplete);
        }
        let mut message_bytes = vec![0u8; sm_length as usize];
        buf.copy_to_slice(&mut message_bytes);
        let short_message =
            ShortMessage::new(&message_bytes).map_err(|e| CodecError::FieldValidation {
                field: "short_message",
                reason: e.to_string(),
            })?;

        let mut submit_sm = SubmitSm {
            command_status: header.command_status,
            sequence_number: header.sequence_number,
            service_type,
            source_addr_ton,
            source_addr_npi,
            source_addr,
            dest_addr_ton,
            dest_addr_npi,
            destination_addr,
            esm_class,
            protocol_id,
            priority_flag,
            schedule_delivery_time,
            validity_period,
            registered_delivery,
            replace_if_present_flag,
            data_coding,
            sm_default_msg_id,
            sm_length,
            short_message,
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

        while buf.has_remaining() {
            let tlv = Tlv::decode(buf)?;
            match tlv.tag {
                tags::USER_MESSAGE_REFERENCE => submit_sm.user_message_reference = Some(tlv),
                tags::SOURCE_PORT => submit_sm.source_port = Some(tlv),
                tags::DESTINATION_PORT => submit_sm.destination_port = Some(tlv),
                tags::SAR_MSG_REF_NUM => submit_sm.sar_msg_ref_num = Some(tlv),
                tags::SAR_TOTAL_SEGMENTS => submit_sm.sar_total_segments = Some(tlv),
                tags::SAR_SEGMENT_SEQNUM => submit_sm.sar_segment_seqnum = Some(tlv),
                tags::USER_DATA_HEADER => submit_sm.user_data_header = Some(tlv),
                tags::PRIVACY_INDICATOR => submit_sm.privacy_indicator = Some(tlv),
                tags::CALLBACK_NUM => submit_sm.callback_num = Some(tlv),
                tags::SOURCE_SUBADDRESS => submit_sm.source_subaddress = Some(tlv),
                tags::DEST_SUBADDRESS => submit_sm.dest_subaddress = Some(tlv),
                tags::LANGUAGE_INDICATOR => submit_sm.language_indicator = Some(tlv),
                tags::ITS_SESSION_INFO => submit_sm.its_session_info = Some(tlv),
                tags::MESSAGE_PAYLOAD => submit_sm.message_payload = Some(tlv),
                _ => {}
            }
        }

        Ok(submit_sm)
    }
}

impl Encodable for SubmitSm {
    fn encode(&self, buf: &mut BytesMut) -> Result<(), CodecError> {
        self.validate().map_err(|e| CodecError::FieldValidation {
            field: "submit_sm",
            reason: e.to_string(),
        })?;

        let header = PduHeader {
            command_length: 0,
            command_id: CommandId::SubmitSm,
            command_status: self.command_status,
            sequence_number: self.sequence_number,
        };
        header.encode(buf)?;

        encode_cstring(buf, self.service_type.as_str(), 6);
        encode_u8(buf, self.source_addr_ton as u8);
        encode_u8(buf, self.source_addr_npi as u8);
        encode_cstring(buf, self.source_addr.as_str().unwrap_or(""), 21);
        encode_u8(buf, self.dest_addr_ton as u8);
        encode_u8(buf, self.dest_addr_npi as u8);
        encode_cstring(buf, self.destination_addr.as_str().unwrap_or(""), 21);
        encode_u8(buf, self.esm_class.to_byte());
        encode_u8(buf, self.protocol_id);
        encode_u8(buf, self.priority_flag);
        encode_cstring(buf, self.schedule_delivery_time.as_str().unwrap_or(""), 17);
        encode_cstring(buf, self.validity_period.as_str().unwrap_or(""), 17);
        encode_u8(buf, self.registered_delivery);
        encode_u8(buf, self.replace_if_present_flag);
        encode_u8(buf, self.data_coding.to_byte());
        encode_u8(buf, self.sm_default_msg_id);
        encode_u8(buf, self.sm_length);

        let message_bytes = self.short_message.as_bytes();
        buf.extend_from_slice(&message_bytes[..(self.sm_length as usize).min(message_bytes.len())]);

        for tlv in [
            &self.user_message_reference,
            &self.source_port,
            &self.destination_port,
            &self.sar_msg_ref_num,
            &self.sar_total_segments,
            &self.sar_segment_seqnum,
            &self.user_data_header,
            &self.privacy_indicator,
            &self.callback_num,
            &self.source_subaddress,
            &self.dest_subaddress,
            &self.language_indicator,
            &self.its_session_info,
            &self.message_payload,
        ] {
            if let Some(tlv) = tlv {
                tlv.encode(buf)?;
            }
        }

        Ok(())
    }

    fn encoded_size(&self) -> usize {
        let mut size = PduHeader::SIZE;
        size += 6 + 1 + 1 + 21 + 1 + 1 + 21 + 1 + 1 + 1 + 17 + 17 + 1 + 1 + 1 + 1 + 1;
        size += self.sm_length as usize;

        for tlv in [
            &self.user_message_reference,
            &self.source_port,
            &self.destination_port,
            &self.sar_msg_ref_num,
            &self.sar_total_segments,
            &self.sar_segment_seqnum,
            &self.user_data_header,
            &self.privacy_indicator,
            &self.callback_num,
            &self.source_subaddress,
            &self.dest_subaddress,
            &self.language_indicator,
            &self.its_session_info,
            &self.message_payload,
        ] {
            if let Some(tlv) = tlv {
                size += tlv.encoded_size();
            }
        }

        size
    }
}

impl Decodable for SubmitSmResponse {
    fn command_id() -> CommandId {
        CommandId::SubmitSmResp
    }

    fn decode(header: PduHeader, buf: &mut Cursor<&[u8]>) -> Result<Self, CodecError> {
        Self::validate_header(&header)?;

        let message_id_str = decode_cstring(buf, 65, "message_id")?;
        let message_id =
            MessageId::from_parsed_string(message_id_str).map_err(|e| CodecError::FieldValidation {
                field: "message_id",
                reason: e.to_string(),
            })?;

        Ok(SubmitSmResponse {
            command_status: header.command_status,
            sequence_number: header.sequence_number,
            message_id,
        })
    }
}

impl Encodable for SubmitSmResponse {
    fn encode(&self, buf: &mut BytesMut) -> Result<(), CodecError> {
        let header = PduHeader {
            command_length: 0,
            command_id: CommandId::SubmitSmResp,
            command_status: self.command_status,
            sequence_number: self.sequence_number,
        };
        header.encode(buf)?;

        encode_cstring(buf, self.message_id.as_str().unwrap_or(""), 65);

        Ok(())
    }

    fn encoded_size(&self) -> usize {
        PduHeader::SIZE + 65
    }
}

impl SubmitSmResponse {
    pub fn new(sequence_number: u32, message_id: &str) -> Self {
        Self {
            command_status: CommandStatus::Ok,
            sequence_number,
            message_id: MessageId::from(message_id),
        }
    }

    pub fn error(sequence_number: u32, status: CommandStatus, message_id: String) -> Self {
        Self {
            command_status: status,
            sequence_number,
            message_id: MessageId::from(message_id.as_str()),
        }
    }
}
