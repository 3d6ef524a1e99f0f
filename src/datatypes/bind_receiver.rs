use crate::codec::{
    CodecError, Decodable, Encodable, PduHeader, decode_cstring, decode_u8, encode_cstring,
    encode_u8,
};
use crate::datatypes::interface_version::InterfaceVersion;
use crate::datatypes::numeric_plan_indicator::NumericPlanIndicator;
use crate::datatypes::tlv::Tlv;
use crate::datatypes::{
    AddressRange, CommandId, CommandStatus, Password, SystemId, SystemType, TypeOfNumber,
};
use bytes::{Buf, BytesMut};
use std::io::Cursor;

/// BindReceiver is used to bind a receiver ESME to the SMSC.
#[derive(Clone, Debug, PartialEq)]
pub struct BindReceiver {
    // pub command_length: u32,
    // pub command_id: CommandId::BindReceiver,
    pub command_status: CommandStatus,
    pub sequence_number: u32,

    // Body
    /// 5.2.1 system_id: This is the identification of the ESME requesting to
    ///       bind as a receiver with the SMSC. It is a fixed length
    ///       alphanumeric field of up to 16 characters. The value may be left
    ///       justified, with trailing blanks (i.e. "abc " is valid). The
    ///       system_id may be used as a destination address for Mobile
    ///       Terminated messages originated by this ESME. The system_id may
    ///       also be used as an originating address for Mobile Originated
    ///        messages sent to this ESME.
    pub system_id: SystemId,

    /// 5.2.2 password: This is the password for authentication. It is a fixed
    ///       length string of 9 characters. If fewer than 9 characters are
    ///       supplied, it must be null padded. If no password is required by
    ///       the SMSC, a NULL (i.e. zero) password should be supplied.
    pub password: Option<Password>,

    /// 5.2.3 system_type: This is used to categorize the type of ESME that is
    ///       binding to the SMSC. Examples include "VMS" (voice mail system)
    ///       and "OTA" (over-the-air activation system). (See section 5.2.7
    ///       for a list of suggested values.) The system_type is specified as
    ///       a fixed length alphanumeric field of up to 13 characters.
    pub system_type: SystemType,

    /// 5.2.4 interface_version: Interface version level supported by the SMSC.
    pub interface_version: InterfaceVersion,

    /// 5.2.5 addr_ton: Type of Number format of the ESME address(es) served
    ///       via this SMPP.
    pub addr_ton: TypeOfNumber,

    /// 5.2.6 addr_npi: Numbering Plan Indicator of the ESME address(es) served
    ///       via this SMPP.
    pub addr_npi: NumericPlanIndicator,

    /// 5.2.7 address_range: This is used to specify a range of SME addresses
    ///       serviced by the ESME. A single address may also be specified.
    pub address_range: AddressRange,
}

#[derive(Debug, thiserror::Error)]
pub enum BindReceiverValidationError {
    #[error("Fixed array fields are always valid - this error should not occur")]
    FixedArrayError,
}

impl BindReceiver {
    /// Validates the BindReceiver PDU according to SMPP v3.4 specification
    /// Fixed array fields are always valid by construction
    pub fn validate(&self) -> Result<(), BindReceiverValidationError> {
        // Fixed-size arrays guarantee field length constraints are met
        Ok(())
    }

    /// Creates a builder for constructing BindReceiver PDUs with validation
    pub fn builder() -> BindReceiverBuilder {
        BindReceiverBuilder::new()
    }

    pub fn new(sequence_number: u32, system_id: &str, password: &str) -> Self {
        Self {
            command_status: CommandStatus::Ok,
            sequence_number,
            system_id: SystemId::from(system_id),
            password: if password.is_empty() {
                None
            } else {
                Some(Password::from(password))
            },
            system_type: SystemType::default(),
            interface_version: InterfaceVersion::SmppV34,
            addr_ton: TypeOfNumber::Unknown,
            addr_npi: NumericPlanIndicator::Unknown,
            address_range: AddressRange::default(),
        }
    }
}

/// Builder for creating BindReceiver PDUs with validation and sensible defaults
pub struct BindReceiverBuilder {
    command_status: CommandStatus,
    sequence_number: u32,
    system_id: SystemId,
    password: Option<Password>,
    system_type: SystemType,
    interface_version: InterfaceVersion,
    addr_ton: TypeOfNumber,
    addr_npi: NumericPlanIndicator,
    address_range: AddressRange,
}

impl Default for BindReceiverBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl BindReceiverBuilder {
    pub fn new() -> Self {
        Self {
            command_status: CommandStatus::Ok,
            sequence_number: 1,
            system_id: SystemId::default(),
            password: None,
            system_type: SystemType::default(),
            interface_version: InterfaceVersion::SmppV34,
            addr_ton: TypeOfNumber::Unknown,
            addr_npi: NumericPlanIndicator::Unknown,
            address_range: AddressRange::default(),
        }
    }

    pub fn sequence_number(mut self, seq: u32) -> Self {
        self.sequence_number = seq;
        self
    }

    pub fn system_id(mut self, system_id: &str) -> Self {
        self.system_id = SystemId::from(system_id);
        self
    }

    pub fn password(mut self, password: &str) -> Self {
        self.password = Some(Password::from(password));
        self
    }

    pub fn system_type(mut self, system_type: &str) -> Self {
        self.system_type = SystemType::from(system_type);
        self
    }

    pub fn interface_version(mut self, version: InterfaceVersion) -> Self {
        self.interface_version = version;
        self
    }

    pub fn addr_ton(mut self, ton: TypeOfNumber) -> Self {
        self.addr_ton = ton;
        self
    }

    pub fn addr_npi(mut self, npi: NumericPlanIndicator) -> Self {
        self.addr_npi = npi;
        self
    }

    pub fn address_range(mut self, range: &str) -> Self {
        self.address_range = AddressRange::from(range);
        self
    }

    /// Build the BindReceiver, performing validation
    pub fn build(self) -> Result<BindReceiver, BindReceiverValidationError> {
        let bind_receiver = BindReceiver {
            command_status: self.command_status,
            sequence_number: self.sequence_number,
            system_id: self.system_id,
            password: self.password,
            system_type: self.system_type,
            interface_version: self.interface_version,
            addr_ton: self.addr_ton,
            addr_npi: self.addr_npi,
            address_range: self.address_range,
        };

        // Validate before returning
        bind_receiver.validate()?;
        Ok(bind_receiver)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct BindReceiverResponse {
    // pub command_length: u32,
    // pub command_id: CommandId,
    pub command_status: CommandStatus,
    pub sequence_number: u32,
    // body
    pub system_id: SystemId,
    pub sc_interface_version: Option<Tlv>,
}

impl Decodable for BindReceiver {
    fn command_id() -> CommandId {
        CommandId::BindReceiver
    }

    fn decode(header: PduHeader, buf: &mut Cursor<&[u8]>) -> Result<Self, CodecError> {
        Self::validate_header(&header)?;

        let system_id_str = decode_cstring(buf, 16, "system_id")?;
        let password_str = decode_cstring(buf, 9, "password")?;
        let system_type_str = decode_cstring(buf, 13, "system_type")?;
        let interface_version = InterfaceVersion::try_from(decode_u8(buf)?).map_err(|_| {
            CodecError::FieldValidation {
                field: "interface_version",
                reason: "Invalid interface version".to_string(),
            }
        })?;
        let addr_ton =
            TypeOfNumber::try_from(decode_u8(buf)?).map_err(|_| CodecError::FieldValidation {
                field: "addr_ton",
                reason: "Invalid type of number".to_string(),
            })?;
        let addr_npi = NumericPlanIndicator::try_from(decode_u8(buf)?).map_err(|_| {
            CodecError::FieldValidation {
                field: "addr_npi",
                reason: "Invalid numbering plan indicator".to_string(),
            }
        })?;
        let address_range_str = decode_cstring(buf, 41, "address_range")?;

        let system_id = SystemId::from_parsed_string(system_id_str).map_err(|e| {
            CodecError::FieldValidation {
                field: "system_id",
                reason: e.to_string(),
            }
        })?;
        let password = if password_str.is_empty() {
            None
        } else {
            Some(Password::from_parsed_string(password_str).map_err(|e| {
                CodecError::FieldValidation {
                    field: "password",
                    reason: e.to_string(),
                }
            })?)
        };
        let system_type = SystemType::from_parsed_string(system_type_str).map_err(|e| {
            CodecError::FieldValidation {
                field: "system_type",
                reason: e.to_string(),
            }
        })?;
        let address_range = AddressRange::from_parsed_string(address_range_str).map_err(|e| {
            CodecError::FieldValidation {
                field: "address_range",
                reason: e.to_string(),
            }
        })?;

        Ok(BindReceiver {
            command_status: header.command_status,
            sequence_number: header.sequence_number,
            system_id,
            password,
            system_type,
            interface_version,
            addr_ton,
            addr_npi,
            address_range,
        })
    }
}

impl Encodable for BindReceiver {
    fn encode(&self, buf: &mut BytesMut) -> Result<(), CodecError> {
        let body_size = 16 + 9 + 13 + 1 + 1 + 1 + 41;
        let total_length = PduHeader::SIZE + body_size;

        let header = PduHeader {
            command_length: total_length as u32,
            command_id: CommandId::BindReceiver,
            command_status: self.command_status,
            sequence_number: self.sequence_number,
        };
        header.encode(buf)?;

        encode_cstring(buf, self.system_id.as_str().unwrap_or(""), 16);
        encode_cstring(
            buf,
            self.password
                .as_ref()
                .map(|p| p.as_str().unwrap_or(""))
                .unwrap_or(""),
            9,
        );
        encode_cstring(buf, self.system_type.as_str().unwrap_or(""), 13);
        encode_u8(buf, self.interface_version as u8);
        encode_u8(buf, self.addr_ton as u8);
        encode_u8(buf, self.addr_npi as u8);
        encode_cstring(buf, self.address_range.as_str().unwrap_or(""), 41);

        Ok(())
    }

    fn encoded_size(&self) -> usize {
        PduHeader::SIZE + 16 + 9 + 13 + 1 + 1 + 1 + 41
    }
}

impl Decodable for BindReceiverResponse {
    fn command_id() -> CommandId {
        CommandId::BindReceiverResp
    }

    fn decode(header: PduHeader, buf: &mut Cursor<&[u8]>) -> Result<Self, CodecError> {
        Self::validate_header(&header)?;

        let system_id_str = decode_cstring(buf, 16, "system_id")?;
        let system_id = SystemId::from_parsed_string(system_id_str).map_err(|e| {
            CodecError::FieldValidation {
                field: "system_id",
                reason: e.to_string(),
            }
        })?;

        let sc_interface_version = if buf.has_remaining() {
            Some(Tlv::decode(buf)?)
        } else {
            None
        };

        Ok(BindReceiverResponse {
            command_status: header.command_status,
            sequence_number: header.sequence_number,
            system_id,
            sc_interface_version,
        })
    }
}

impl Encodable for BindReceiverResponse {
    fn encode(&self, buf: &mut BytesMut) -> Result<(), CodecError> {
        let header = PduHeader {
            command_length: 0,
            command_id: CommandId::BindReceiverResp,
            command_status: self.command_status,
            sequence_number: self.sequence_number,
        };
        header.encode(buf)?;

        encode_cstring(buf, self.system_id.as_str().unwrap_or(""), 16);

        if let Some(ref tlv) = self.sc_interface_version {
            tlv.encode(buf)?;
        }

        Ok(())
    }

    fn encoded_size(&self) -> usize {
        let mut size = PduHeader::SIZE + 16;
        if let Some(ref tlv) = self.sc_interface_version {
            size += tlv.encoded_size();
        }
        size
    }
}

impl BindReceiverResponse {
    pub fn new(sequence_number: u32, system_id: &str) -> Self {
        Self {
            command_status: CommandStatus::Ok,
            sequence_number,
            system_id: SystemId::from(system_id),
            sc_interface_version: None,
        }
    }

    pub fn error(sequence_number: u32, status: CommandStatus, system_id: String) -> Self {
        Self {
            command_status: status,
            sequence_number,
            system_id: SystemId::from(system_id.as_str()),
            sc_interface_version: None,
        }
    }
}
