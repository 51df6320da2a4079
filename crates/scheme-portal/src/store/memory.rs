use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;

use super::RepositoryError;
use crate::applicants::{
    Applicant, ApplicantProfile, ApplicantRepository, ApplicationStatus, SchemeApplication,
};
use crate::grievances::{Grievance, GrievanceRepository, GrievanceStatus};
use crate::ids::{ApplicantId, ApplicationId, GrievanceId, SchemeId};
use crate::schemes::{Scheme, SchemeRepository};

fn lock<'a, T>(mutex: &'a Mutex<T>, store: &str) -> Result<MutexGuard<'a, T>, RepositoryError> {
    mutex
        .lock()
        .map_err(|_| RepositoryError::Unavailable(format!("{store} store lock poisoned")))
}

fn validated<T>(outcome: Result<(), Vec<String>>, record: T) -> Result<T, RepositoryError> {
    match outcome {
        Ok(()) => Ok(record),
        Err(problems) => Err(RepositoryError::Validation(problems.join(". "))),
    }
}

/// One applicant collection, keyed by record id. Clones share the same storage.
pub struct MemoryApplicantStore<P> {
    records: Arc<Mutex<HashMap<ApplicantId, Applicant<P>>>>,
}

impl<P> Default for MemoryApplicantStore<P> {
    fn default() -> Self {
        Self {
            records: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

impl<P> Clone for MemoryApplicantStore<P> {
    fn clone(&self) -> Self {
        Self {
            records: Arc::clone(&self.records),
        }
    }
}

impl<P: ApplicantProfile> MemoryApplicantStore<P> {
    fn guard(&self) -> Result<MutexGuard<'_, HashMap<ApplicantId, Applicant<P>>>, RepositoryError> {
        lock(&self.records, P::KIND.label())
    }
}

impl<P: ApplicantProfile> ApplicantRepository for MemoryApplicantStore<P> {
    type Profile = P;

    fn insert(&self, applicant: Applicant<P>) -> Result<Applicant<P>, RepositoryError> {
        let applicant = validated(applicant.validate(), applicant)?;
        let mut records = self.guard()?;
        let taken = records.contains_key(&applicant.id)
            || records
                .values()
                .any(|existing| existing.unique_id == applicant.unique_id);
        if taken {
            return Err(RepositoryError::Conflict);
        }
        records.insert(applicant.id, applicant.clone());
        Ok(applicant)
    }

    fn fetch(&self, id: &ApplicantId) -> Result<Option<Applicant<P>>, RepositoryError> {
        Ok(self.guard()?.get(id).cloned())
    }

    fn fetch_by_unique_id(&self, unique_id: &str) -> Result<Option<Applicant<P>>, RepositoryError> {
        Ok(self
            .guard()?
            .values()
            .find(|applicant| applicant.unique_id == unique_id)
            .cloned())
    }

    fn unique_id_taken(&self, unique_id: &str) -> Result<bool, RepositoryError> {
        Ok(self
            .guard()?
            .values()
            .any(|applicant| applicant.unique_id == unique_id))
    }

    fn list(&self) -> Result<Vec<Applicant<P>>, RepositoryError> {
        let mut applicants: Vec<_> = self.guard()?.values().cloned().collect();
        applicants.sort_by_key(|applicant| applicant.created_at);
        Ok(applicants)
    }

    fn append_application(
        &self,
        id: &ApplicantId,
        application: SchemeApplication,
    ) -> Result<Applicant<P>, RepositoryError> {
        let mut records = self.guard()?;
        let applicant = records.get_mut(id).ok_or(RepositoryError::NotFound)?;
        if applicant.application_for(&application.scheme_id).is_some() {
            return Err(RepositoryError::Conflict);
        }
        applicant.applied_schemes.push(application);
        applicant.updated_at = Utc::now();
        Ok(applicant.clone())
    }

    fn update_application_status(
        &self,
        id: &ApplicantId,
        application_id: &ApplicationId,
        status: ApplicationStatus,
    ) -> Result<SchemeApplication, RepositoryError> {
        let mut records = self.guard()?;
        let applicant = records.get_mut(id).ok_or(RepositoryError::NotFound)?;
        let application = applicant
            .applied_schemes
            .iter_mut()
            .find(|application| &application.id == application_id)
            .ok_or(RepositoryError::NotFound)?;
        application.status = status;
        let updated = application.clone();
        applicant.updated_at = Utc::now();
        Ok(updated)
    }
}

#[derive(Default, Clone)]
pub struct MemorySchemeStore {
    records: Arc<Mutex<HashMap<SchemeId, Scheme>>>,
}

impl MemorySchemeStore {
    fn guard(&self) -> Result<MutexGuard<'_, HashMap<SchemeId, Scheme>>, RepositoryError> {
        lock(&self.records, "scheme")
    }
}

fn check_scheme(scheme: &Scheme) -> Result<(), RepositoryError> {
    if scheme.name.trim().is_empty() {
        return Err(RepositoryError::Validation("name is required".to_string()));
    }
    Ok(())
}

impl SchemeRepository for MemorySchemeStore {
    fn insert(&self, scheme: Scheme) -> Result<Scheme, RepositoryError> {
        check_scheme(&scheme)?;
        let mut records = self.guard()?;
        if records.contains_key(&scheme.id) {
            return Err(RepositoryError::Conflict);
        }
        records.insert(scheme.id, scheme.clone());
        Ok(scheme)
    }

    fn fetch(&self, id: &SchemeId) -> Result<Option<Scheme>, RepositoryError> {
        Ok(self.guard()?.get(id).cloned())
    }

    fn fetch_many(&self, ids: &[SchemeId]) -> Result<HashMap<SchemeId, Scheme>, RepositoryError> {
        let records = self.guard()?;
        Ok(ids
            .iter()
            .filter_map(|id| records.get(id).map(|scheme| (*id, scheme.clone())))
            .collect())
    }

    fn replace(&self, scheme: Scheme) -> Result<Scheme, RepositoryError> {
        check_scheme(&scheme)?;
        let mut records = self.guard()?;
        let current = records.get_mut(&scheme.id).ok_or(RepositoryError::NotFound)?;
        if current.target != scheme.target {
            return Err(RepositoryError::Validation(
                "target cannot be changed".to_string(),
            ));
        }
        *current = scheme.clone();
        Ok(scheme)
    }

    fn delete(&self, id: &SchemeId) -> Result<Scheme, RepositoryError> {
        self.guard()?.remove(id).ok_or(RepositoryError::NotFound)
    }

    fn list(&self) -> Result<Vec<Scheme>, RepositoryError> {
        let mut schemes: Vec<_> = self.guard()?.values().cloned().collect();
        schemes.sort_by_key(|scheme| scheme.created_at);
        Ok(schemes)
    }
}

#[derive(Default, Clone)]
pub struct MemoryGrievanceStore {
    records: Arc<Mutex<HashMap<GrievanceId, Grievance>>>,
}

impl MemoryGrievanceStore {
    fn guard(&self) -> Result<MutexGuard<'_, HashMap<GrievanceId, Grievance>>, RepositoryError> {
        lock(&self.records, "grievance")
    }
}

impl GrievanceRepository for MemoryGrievanceStore {
    fn insert(&self, grievance: Grievance) -> Result<Grievance, RepositoryError> {
        let grievance = validated(grievance.validate(), grievance)?;
        let mut records = self.guard()?;
        if records.contains_key(&grievance.id) {
            return Err(RepositoryError::Conflict);
        }
        records.insert(grievance.id, grievance.clone());
        Ok(grievance)
    }

    fn list(&self) -> Result<Vec<Grievance>, RepositoryError> {
        Ok(self.guard()?.values().cloned().collect())
    }

    fn update_status(
        &self,
        id: &GrievanceId,
        status: GrievanceStatus,
    ) -> Result<Grievance, RepositoryError> {
        let mut records = self.guard()?;
        let grievance = records.get_mut(id).ok_or(RepositoryError::NotFound)?;
        grievance.status = status;
        grievance.updated_at = Utc::now();
        Ok(grievance.clone())
    }
}
