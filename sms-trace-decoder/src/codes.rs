//! MAP / TCAP / SMS-TPDU code tables
//!
//! Closed enumerations for every integer code the frame decoder interprets.
//! Each table converts from its wire integer with an `Option`, so an
//! out-of-range value surfaces as a typed decode failure instead of a panic.

use serde::{Deserialize, Serialize};
use std::fmt;

/// TCAP dialogue phase, taken from which framing element a frame carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionPhase {
    Begin,
    Continue,
    End,
}

impl fmt::Display for TransactionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionPhase::Begin => write!(f, "Begin"),
            TransactionPhase::Continue => write!(f, "Continue"),
            TransactionPhase::End => write!(f, "End"),
        }
    }
}

/// Signaling operation or outcome carried by one event
///
/// The first three variants are outcomes rather than MAP operations; the rest
/// are the short message service opcodes (3GPP TS 29.002).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Operation {
    /// No operation-identifying element was found
    Unknown,
    /// Successful returnResultLast component
    ResultLast,
    /// returnError component
    Error,
    /// mt-forwardSM (44)
    MtForwardSm,
    /// sendRoutingInfoForSM (45)
    SendRoutingInfoForSm,
    /// mo-forwardSM (46). MAP v1/v2 `forwardSM` shares this opcode.
    MoForwardSm,
    /// reportSM-DeliveryStatus (47)
    ReportSmDeliveryStatus,
    /// alertServiceCentreWithoutResult (49)
    AlertServiceCentreWithoutResult,
    /// readyForSM (66)
    ReadyForSm,
}

impl Operation {
    /// Map a MAP local opcode to an operation
    pub fn from_opcode(code: u32) -> Option<Self> {
        match code {
            44 => Some(Operation::MtForwardSm),
            45 => Some(Operation::SendRoutingInfoForSm),
            46 => Some(Operation::MoForwardSm),
            47 => Some(Operation::ReportSmDeliveryStatus),
            49 => Some(Operation::AlertServiceCentreWithoutResult),
            66 => Some(Operation::ReadyForSm),
            _ => None,
        }
    }

    /// The MAP local opcode, `None` for outcome variants
    pub fn opcode(&self) -> Option<u32> {
        match self {
            Operation::MtForwardSm => Some(44),
            Operation::SendRoutingInfoForSm => Some(45),
            Operation::MoForwardSm => Some(46),
            Operation::ReportSmDeliveryStatus => Some(47),
            Operation::AlertServiceCentreWithoutResult => Some(49),
            Operation::ReadyForSm => Some(66),
            Operation::Unknown | Operation::ResultLast | Operation::Error => None,
        }
    }

    /// Short name used in reports
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Unknown => "Unknown",
            Operation::ResultLast => "ResultLast",
            Operation::Error => "Error",
            Operation::MtForwardSm => "MT_Forward_SM",
            Operation::SendRoutingInfoForSm => "SRI",
            Operation::MoForwardSm => "MO_Forward_SM",
            Operation::ReportSmDeliveryStatus => "Report_SM_DeliveryStatus",
            Operation::AlertServiceCentreWithoutResult => "AlertServiceCentreWithoutResult",
            Operation::ReadyForSm => "readyForSM",
        }
    }

    /// True for mo-forwardSM / mt-forwardSM
    pub fn is_forward_sm(&self) -> bool {
        matches!(self, Operation::MoForwardSm | Operation::MtForwardSm)
    }

    /// True for the outcome of a dialogue (result or error)
    pub fn is_response(&self) -> bool {
        matches!(self, Operation::ResultLast | Operation::Error)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// SM-RP-DA address kind of a forward short message invoke
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DestinationAddressKind {
    Imsi,
    Lmsi,
    Msisdn,
    RoamingNumber,
    ServiceCentreAddress,
}

impl DestinationAddressKind {
    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            0 => Some(DestinationAddressKind::Imsi),
            1 => Some(DestinationAddressKind::Lmsi),
            2 => Some(DestinationAddressKind::Msisdn),
            3 => Some(DestinationAddressKind::RoamingNumber),
            4 => Some(DestinationAddressKind::ServiceCentreAddress),
            _ => None,
        }
    }

    pub fn code(&self) -> u32 {
        match self {
            DestinationAddressKind::Imsi => 0,
            DestinationAddressKind::Lmsi => 1,
            DestinationAddressKind::Msisdn => 2,
            DestinationAddressKind::RoamingNumber => 3,
            DestinationAddressKind::ServiceCentreAddress => 4,
        }
    }
}

impl fmt::Display for DestinationAddressKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DestinationAddressKind::Imsi => write!(f, "IMSI"),
            DestinationAddressKind::Lmsi => write!(f, "LMSI"),
            DestinationAddressKind::Msisdn => write!(f, "MSISDN"),
            DestinationAddressKind::RoamingNumber => write!(f, "roaming number"),
            DestinationAddressKind::ServiceCentreAddress => write!(f, "service centre address"),
        }
    }
}

/// SMS transfer protocol message type indicator (TP-MTI)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageTypeIndicator {
    /// SMS-DELIVER
    MobileTerminated,
    /// SMS-SUBMIT
    MobileOriginated,
    /// SMS-STATUS-REPORT
    StatusReport,
}

impl MessageTypeIndicator {
    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            0 => Some(MessageTypeIndicator::MobileTerminated),
            1 => Some(MessageTypeIndicator::MobileOriginated),
            2 => Some(MessageTypeIndicator::StatusReport),
            _ => None,
        }
    }
}

macro_rules! error_codes {
    ($($variant:ident = $code:literal,)+) => {
        /// MAP user error codes (3GPP TS 29.002, section 17.6)
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum ErrorCode {
            $($variant,)+
            /// Error code outside the table
            Unknown,
        }

        impl ErrorCode {
            /// Map a MAP error local value to an error code
            pub fn from_code(code: u32) -> Option<Self> {
                match code {
                    $($code => Some(ErrorCode::$variant),)+
                    _ => None,
                }
            }

            /// Wire value, `None` for [`ErrorCode::Unknown`]
            pub fn code(&self) -> Option<u32> {
                match self {
                    $(ErrorCode::$variant => Some($code),)+
                    ErrorCode::Unknown => None,
                }
            }

            /// Symbolic name, as stored in an error event's identity
            pub fn name(&self) -> &'static str {
                match self {
                    $(ErrorCode::$variant => stringify!($variant),)+
                    ErrorCode::Unknown => "Unknown",
                }
            }
        }
    };
}

error_codes! {
    // Identification and numbering
    UnknownSubscriber = 1,
    UnknownMsc = 3,
    UnidentifiedSubscriber = 5,
    AbsentSubscriberSm = 6,
    UnknownEquipment = 7,
    NumberChanged = 144,
    // Subscription
    RoamingNotAllowed = 8,
    IllegalSubscriber = 9,
    BearerServiceNotProvisioned = 10,
    TeleserviceNotProvisioned = 11,
    IllegalEquipment = 12,
    // Call handling
    CallBarred = 13,
    ForwardingViolation = 14,
    CugReject = 15,
    AbsentSubscriber = 27,
    NoRoamingNumberAvailable = 39,
    BusySubscriber = 45,
    NoSubscriberReply = 46,
    ForwardingFailed = 47,
    OrNotAllowed = 48,
    // Supplementary services
    IllegalSsOperation = 16,
    SsErrorStatus = 17,
    SsNotAvailable = 18,
    SsSubscriptionViolation = 19,
    SsIncompatibility = 20,
    ShortTermDenial = 29,
    LongTermDenial = 30,
    PwRegistrationFailure = 37,
    NegativePwCheck = 38,
    NumberOfPwAttemptsViolation = 43,
    UnknownAlphabet = 71,
    UssdBusy = 72,
    // Generic
    FacilityNotSupported = 21,
    IncompatibleTerminal = 28,
    SystemFailure = 34,
    DataMissing = 35,
    UnexpectedDataValue = 36,
    ResourceLimitation = 51,
    // Group call
    OngoingGroupCall = 22,
    NoGroupCallNumberAvailable = 50,
    // Handover
    NoHandoverNumberAvailable = 25,
    SubsequentHandoverFailure = 26,
    TargetCellOutsideGroupCallArea = 42,
    // Operation and maintenance
    TracingBufferFull = 40,
    // Short message service
    SubscriberBusyForMtSms = 31,
    SmDeliveryFailure = 32,
    MessageWaitingListFull = 33,
    // Any time interrogation / information handling
    AtiNotAllowed = 49,
    AtsiNotAllowed = 60,
    AtmNotAllowed = 61,
    InformationNotAvailable = 62,
    // Location services
    UnauthorizedRequestingNetwork = 52,
    UnauthorizedLcsClient = 53,
    PositionMethodFailure = 54,
    UnknownOrUnreachableLcsClient = 58,
    MmEventNotSupported = 59,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
