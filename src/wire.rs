//! `embedded-hal` I2C on top of the Arduino `Wire` object.
//!
//! The PRIZM library talks to its controllers through `Wire`, so the color sensor
//! has to share it rather than drive the TWI peripheral directly.

use embedded_hal::i2c::{self, ErrorKind, I2c, NoAcknowledgeSource, Operation, SevenBitAddress};
use tetrix_sys::{
    twi_bridge_begin, twi_bridge_begin_transmission, twi_bridge_end_transmission,
    twi_bridge_read, twi_bridge_write, TWI_BRIDGE_BUFFER_LENGTH,
};

/// Failures reported by `Wire.endTransmission` and `Wire.requestFrom`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ufmt::derive::uDebug)]
pub enum WireError {
    /// More bytes than fit the 32 byte `Wire` buffers.
    DataTooLong,
    AddressNack,
    DataNack,
    Timeout,
    /// Any other non-zero `endTransmission` status.
    Bus(u8),
    /// Fewer bytes arrived than were requested.
    ShortRead,
}

impl WireError {
    fn from_status(status: u8) -> Result<(), Self> {
        match status {
            0 => Ok(()),
            1 => Err(WireError::DataTooLong),
            2 => Err(WireError::AddressNack),
            3 => Err(WireError::DataNack),
            5 => Err(WireError::Timeout),
            other => Err(WireError::Bus(other)),
        }
    }
}

impl i2c::Error for WireError {
    fn kind(&self) -> ErrorKind {
        match self {
            WireError::AddressNack => ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address),
            WireError::DataNack => ErrorKind::NoAcknowledge(NoAcknowledgeSource::Data),
            WireError::Bus(_) => ErrorKind::Bus,
            WireError::DataTooLong | WireError::Timeout | WireError::ShortRead => {
                ErrorKind::Other
            }
        }
    }
}

pub struct ArduinoWire {
    _private: (),
}

impl ArduinoWire {
    /// Joins the bus as controller. Safe to call after `PrizmBegin` has done the same.
    pub fn new() -> Self {
        unsafe { twi_bridge_begin() };
        Self { _private: () }
    }
}

impl i2c::ErrorType for ArduinoWire {
    type Error = WireError;
}

impl ArduinoWire {
    /// One transmission holding every write of the run.
    fn write_run(
        address: SevenBitAddress,
        run: &[Operation<'_>],
        send_stop: u8,
    ) -> Result<(), WireError> {
        unsafe { twi_bridge_begin_transmission(address) };
        for operation in run {
            if let Operation::Write(bytes) = operation {
                let queued = unsafe { twi_bridge_write(bytes.as_ptr(), bytes.len() as _) };
                if queued as usize != bytes.len() {
                    return Err(WireError::DataTooLong);
                }
            }
        }
        WireError::from_status(unsafe { twi_bridge_end_transmission(send_stop) })
    }

    /// One request for the whole run, split back over the read buffers.
    fn read_run(
        address: SevenBitAddress,
        run: &mut [Operation<'_>],
        send_stop: u8,
    ) -> Result<(), WireError> {
        let total: usize = run
            .iter()
            .map(|operation| match operation {
                Operation::Read(buffer) => buffer.len(),
                Operation::Write(_) => 0,
            })
            .sum();

        let mut storage = [0u8; TWI_BRIDGE_BUFFER_LENGTH as usize];
        let Some(received) = storage.get_mut(..total) else {
            return Err(WireError::DataTooLong);
        };
        let count = unsafe {
            twi_bridge_read(address, received.as_mut_ptr(), total as _, send_stop)
        };
        if count as usize != total {
            return Err(WireError::ShortRead);
        }

        let mut offset = 0;
        for operation in run {
            if let Operation::Read(buffer) = operation {
                let end = offset + buffer.len();
                buffer.copy_from_slice(&received[offset..end]);
                offset = end;
            }
        }
        Ok(())
    }
}

fn same_kind(a: &Operation<'_>, b: &Operation<'_>) -> bool {
    matches!(
        (a, b),
        (Operation::Write(_), Operation::Write(_)) | (Operation::Read(_), Operation::Read(_))
    )
}

impl I2c<SevenBitAddress> for ArduinoWire {
    /// Adjacent operations of the same kind share one transfer. Each change of
    /// direction is a repeated start; the stop follows the last operation.
    fn transaction(
        &mut self,
        address: SevenBitAddress,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        let count = operations.len();
        let mut start = 0;

        while start < count {
            let mut end = start + 1;
            while end < count && same_kind(&operations[start], &operations[end]) {
                end += 1;
            }
            let send_stop = u8::from(end == count);

            let run = &mut operations[start..end];
            if matches!(run[0], Operation::Write(_)) {
                Self::write_run(address, run, send_stop)?;
            } else {
                Self::read_run(address, run, send_stop)?;
            }
            start = end;
        }

        Ok(())
    }
}
