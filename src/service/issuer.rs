use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use super::normalize_email;
use crate::error::{Error, Result};
use crate::notify::{Notification, Notifier};
use crate::store::Store;
use crate::types::{AvailabilityRequest, Employee, RequestDescriptor};

/// A token resolved to the request it names and the employee it speaks for.
#[derive(Debug, Clone)]
pub struct ResolvedRequest {
    pub request: AvailabilityRequest,
    pub employee: Employee,
}

/// Looks up the request named by `token`. Strings that are not UUIDs never
/// reach the store.
pub(super) fn lookup_request(
    store: &dyn Store,
    token: &str,
) -> Result<Option<AvailabilityRequest>> {
    let Ok(id) = Uuid::parse_str(token.trim()) else {
        return Ok(None);
    };
    store.get_request(&id.hyphenated().to_string())
}

/// Mints availability requests and maps their tokens back to employees.
#[derive(Clone)]
pub struct Issuer {
    store: Arc<dyn Store>,
    notifier: Arc<dyn Notifier>,
    link_base: String,
}

impl Issuer {
    pub fn new(store: Arc<dyn Store>, notifier: Arc<dyn Notifier>, link_base: &str) -> Self {
        Self {
            store,
            notifier,
            link_base: link_base.trim_end_matches('/').to_string(),
        }
    }

    /// Employee-facing URL for `token`.
    #[must_use]
    pub fn link_for(&self, token: &str) -> String {
        format!("{}/availability?token={token}", self.link_base)
    }

    /// Issues one request per employee. Every id is checked before anything
    /// is written; repeated ids are issued once.
    pub fn issue_requests(
        &self,
        scheduler_id: &str,
        employee_ids: &[String],
    ) -> Result<Vec<AvailabilityRequest>> {
        if employee_ids.is_empty() {
            return Err(Error::Validation("at least one employee is required".to_string()));
        }

        let mut seen = HashSet::new();
        let mut employees = Vec::new();
        for id in employee_ids {
            if !seen.insert(id.as_str()) {
                continue;
            }
            let employee = self
                .store
                .get_employee(scheduler_id, id)?
                .ok_or(Error::NotFound)?;
            employees.push(employee);
        }

        let mut requests = Vec::with_capacity(employees.len());
        for employee in employees {
            let request = self.mint(
                scheduler_id,
                RequestDescriptor::EmployeeKeyed {
                    employee_id: employee.id.clone(),
                },
            )?;
            self.notify(&employee.email, &request);
            requests.push(request);
        }

        tracing::info!(scheduler_id, count = requests.len(), "Issued availability requests");
        Ok(requests)
    }

    /// Issues requests by address. An address that belongs to an employee of
    /// the scheduler yields an employee-keyed request; any other stays
    /// email-keyed until an employee takes that address.
    pub fn issue_requests_by_email(
        &self,
        scheduler_id: &str,
        emails: &[String],
    ) -> Result<Vec<AvailabilityRequest>> {
        if emails.is_empty() {
            return Err(Error::Validation("at least one email is required".to_string()));
        }

        let mut normalized = Vec::with_capacity(emails.len());
        for email in emails {
            let email = normalize_email(email)?;
            if !normalized.contains(&email) {
                normalized.push(email);
            }
        }

        let mut requests = Vec::with_capacity(normalized.len());
        for email in normalized {
            let request = self.mint(
                scheduler_id,
                RequestDescriptor::EmailKeyed {
                    email: email.clone(),
                },
            )?;
            self.notify(&email, &request);
            requests.push(request);
        }

        tracing::info!(
            scheduler_id,
            count = requests.len(),
            "Issued email-keyed availability requests"
        );
        Ok(requests)
    }

    /// Maps a token to its request and employee. Unknown tokens, malformed
    /// tokens and requests still keyed by email all report `NotFound`.
    pub fn resolve(&self, token: &str) -> Result<ResolvedRequest> {
        let request = lookup_request(self.store.as_ref(), token)?.ok_or(Error::NotFound)?;

        let RequestDescriptor::EmployeeKeyed { employee_id } = &request.descriptor else {
            return Err(Error::NotFound);
        };
        let employee = self
            .store
            .get_employee(&request.scheduler_id, employee_id)?
            .ok_or(Error::NotFound)?;

        Ok(ResolvedRequest { request, employee })
    }

    /// Checks that `token` names a live request, without requiring an
    /// employee row behind it.
    pub fn authorize(&self, token: &str) -> Result<AvailabilityRequest> {
        lookup_request(self.store.as_ref(), token)?.ok_or(Error::InvalidToken)
    }

    pub fn get_request(&self, scheduler_id: &str, id: &str) -> Result<AvailabilityRequest> {
        self.store
            .get_request(id)?
            .filter(|r| r.scheduler_id == scheduler_id)
            .ok_or(Error::NotFound)
    }

    pub fn list_requests(&self, scheduler_id: &str) -> Result<Vec<AvailabilityRequest>> {
        self.store.list_requests(scheduler_id)
    }

    /// Requests keyed to `employee`.
    pub fn list_employee_requests(&self, employee: &Employee) -> Result<Vec<AvailabilityRequest>> {
        self.store.list_employee_requests(employee)
    }

    /// Deletes the request; its token stops working and its entries go
    /// with it.
    pub fn revoke_request(&self, scheduler_id: &str, id: &str) -> Result<()> {
        if !self.store.delete_request(scheduler_id, id)? {
            return Err(Error::NotFound);
        }
        tracing::info!(scheduler_id, request_id = id, "Revoked availability request");
        Ok(())
    }

    /// Re-keys a request to an employee of the same scheduler.
    pub fn bind_request(
        &self,
        scheduler_id: &str,
        id: &str,
        employee_id: &str,
    ) -> Result<AvailabilityRequest> {
        self.store
            .get_employee(scheduler_id, employee_id)?
            .ok_or(Error::NotFound)?;
        if !self.store.bind_request(scheduler_id, id, employee_id)? {
            return Err(Error::NotFound);
        }
        self.get_request(scheduler_id, id)
    }

    fn mint(&self, scheduler_id: &str, descriptor: RequestDescriptor) -> Result<AvailabilityRequest> {
        let request = AvailabilityRequest {
            id: Uuid::new_v4().to_string(),
            scheduler_id: scheduler_id.to_string(),
            descriptor,
            created_at: Utc::now(),
        };
        self.store.create_request(&request)
    }

    fn notify(&self, to: &str, request: &AvailabilityRequest) {
        let notification = Notification::availability_request(to, &self.link_for(&request.id));
        if let Err(e) = self.notifier.send(&notification) {
            tracing::warn!(request_id = %request.id, "Failed to deliver availability link: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::testing::Harness;

    #[test]
    fn test_issue_notifies_each_employee() {
        let h = Harness::new();
        let s = h.scheduler("Acme");
        let a = h.employee(&s, "a@x.com");
        let b = h.employee(&s, "b@x.com");

        let requests = h
            .issuer
            .issue_requests(&s, &[a.id.clone(), b.id.clone(), a.id.clone()])
            .unwrap();
        assert_eq!(requests.len(), 2);
        assert_ne!(requests[0].id, requests[1].id);

        let sent = h.notifier.sent();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].to, "a@x.com");
        assert!(sent[0].body.contains(&format!(
            "http://localhost:8080/availability?token={}",
            requests[0].id
        )));
    }

    #[test]
    fn test_issue_rejects_unknown_employee_before_writing() {
        let h = Harness::new();
        let s1 = h.scheduler("Acme");
        let s2 = h.scheduler("Globex");
        let a = h.employee(&s1, "a@x.com");
        let foreign = h.employee(&s2, "f@x.com");

        let err = h
            .issuer
            .issue_requests(&s1, &[a.id.clone(), foreign.id.clone()])
            .unwrap_err();
        assert!(matches!(err, Error::NotFound));
        assert!(h.issuer.list_requests(&s1).unwrap().is_empty());
        assert!(h.notifier.sent().is_empty());

        assert!(matches!(
            h.issuer.issue_requests(&s1, &[]),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn test_known_address_is_keyed_at_issue() {
        let h = Harness::new();
        let s = h.scheduler("Acme");
        let e = h.employee(&s, "e@x.com");

        let keyed = h.token_for(&s, &e);
        let by_email = h
            .issuer
            .issue_requests_by_email(&s, &[" E@X.com ".to_string(), "new@x.com".to_string()])
            .unwrap();
        assert_eq!(
            by_email[0].descriptor,
            RequestDescriptor::EmployeeKeyed {
                employee_id: e.id.clone()
            }
        );
        assert_eq!(
            by_email[1].descriptor,
            RequestDescriptor::EmailKeyed {
                email: "new@x.com".to_string()
            }
        );
        assert_eq!(h.notifier.sent()[0].to, "e@x.com");

        assert_eq!(h.issuer.resolve(&keyed).unwrap().employee, e);
        assert_eq!(h.issuer.resolve(&by_email[0].id).unwrap().employee, e);
        assert!(matches!(h.issuer.resolve(&by_email[1].id), Err(Error::NotFound)));

        // The address gains an owner later.
        let late = h.employee(&s, "new@x.com");
        assert_eq!(h.issuer.resolve(&by_email[1].id).unwrap().employee, late);
    }

    #[test]
    fn test_resolve_failures_are_not_found() {
        let h = Harness::new();
        let s = h.scheduler("Acme");
        let orphan = h
            .issuer
            .issue_requests_by_email(&s, &["nobody@x.com".to_string()])
            .unwrap()
            .remove(0);

        assert!(matches!(h.issuer.resolve("garbage"), Err(Error::NotFound)));
        assert!(matches!(
            h.issuer.resolve(&Uuid::new_v4().to_string()),
            Err(Error::NotFound)
        ));
        assert!(matches!(h.issuer.resolve(&orphan.id), Err(Error::NotFound)));

        // Still a valid token for submissions.
        assert_eq!(h.issuer.authorize(&orphan.id).unwrap().id, orphan.id);
        assert!(matches!(h.issuer.authorize("garbage"), Err(Error::InvalidToken)));
    }

    #[test]
    fn test_tokens_are_unique() {
        let h = Harness::new();
        let s = h.scheduler("Acme");
        let e = h.employee(&s, "e@x.com");

        let mut seen = HashSet::new();
        for _ in 0..50 {
            assert!(seen.insert(h.token_for(&s, &e)));
        }
    }

    #[test]
    fn test_bind_and_revoke() {
        let h = Harness::new();
        let s1 = h.scheduler("Acme");
        let s2 = h.scheduler("Globex");
        let e = h.employee(&s1, "e@x.com");
        let request = h
            .issuer
            .issue_requests_by_email(&s1, &["old@x.com".to_string()])
            .unwrap()
            .remove(0);

        assert!(matches!(
            h.issuer.bind_request(&s2, &request.id, &e.id),
            Err(Error::NotFound)
        ));
        let bound = h.issuer.bind_request(&s1, &request.id, &e.id).unwrap();
        assert_eq!(
            bound.descriptor,
            RequestDescriptor::EmployeeKeyed {
                employee_id: e.id.clone()
            }
        );
        assert_eq!(h.issuer.list_employee_requests(&e).unwrap().len(), 1);

        assert!(matches!(h.issuer.get_request(&s2, &request.id), Err(Error::NotFound)));
        assert!(matches!(h.issuer.revoke_request(&s2, &request.id), Err(Error::NotFound)));
        h.issuer.revoke_request(&s1, &request.id).unwrap();
        assert!(matches!(h.issuer.authorize(&request.id), Err(Error::InvalidToken)));
    }

    #[test]
    fn test_failed_notification_does_not_fail_issue() {
        struct Broken;
        impl Notifier for Broken {
            fn send(&self, _: &Notification) -> Result<()> {
                Err(Error::Validation("mail relay down".to_string()))
            }
        }

        let h = Harness::new();
        let s = h.scheduler("Acme");
        let e = h.employee(&s, "e@x.com");

        let issuer = Issuer::new(h.store.clone(), Arc::new(Broken), "http://localhost/");
        let requests = issuer.issue_requests(&s, &[e.id.clone()]).unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(
            issuer.link_for("abc"),
            "http://localhost/availability?token=abc"
        );
    }
}
