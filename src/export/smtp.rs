//! SMTP hand-off: wire rendering and the envelope passed to a transport.
//!
//! The transport itself lives outside this crate behind [`MailSender`].

use crate::error::Result;
use crate::export::mime;
use crate::model::address::EmailAddress;
use crate::model::mail::Mail;

/// Render the RFC 5322 message handed to SMTP.
///
/// `From` is set to the sending address, `Bcc` is withheld from the
/// headers (its recipients only appear in the envelope) and line endings
/// are CRLF.
pub fn to_smtp_format(mail: &Mail, from_address: &str) -> String {
    let mut message = mime::to_mime_multipart(mail);
    message.remove_header("Bcc");
    message.set_header("From", from_address);
    to_crlf(&message.as_string())
}

fn to_crlf(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\n', "\r\n")
}

/// Sender, recipients and data of one SMTP transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    pub from: String,
    /// Bare addresses of `To`, then `Cc`, then `Bcc`.
    pub recipients: Vec<String>,
    pub data: String,
}

impl Envelope {
    pub fn for_mail(mail: &Mail, from_address: &str) -> Self {
        let headers = mail.headers();
        let recipients = headers
            .to
            .iter()
            .chain(headers.cc.iter())
            .chain(headers.bcc.iter())
            .map(|a| EmailAddress::parse(a).address)
            .filter(|a| !a.is_empty())
            .collect();
        Self {
            from: from_address.to_string(),
            recipients,
            data: to_smtp_format(mail, from_address),
        }
    }
}

/// Delivers an envelope. Implemented by the SMTP collaborator.
pub trait MailSender: Send + Sync {
    fn send(&self, envelope: &Envelope) -> Result<()>;
}
