use chrono::Utc;
use clap::Args;
use scheme_portal::config::{AdminConfig, DEFAULT_MAX_UPLOAD_BYTES};
use scheme_portal::error::{ApiError, AppError};
use scheme_portal::intake::{DocumentIntake, FormFields, UploadForm};
use scheme_portal::portal::Portal;
use scheme_portal::schemes::{Eligibility, SchemeDraft};
use std::path::PathBuf;
use std::sync::Arc;

const DEMO_ADMIN_PASSWORD: &str = "demo-admin";

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Directory receiving the demo uploads. Defaults to a fresh directory under the system
    /// temp dir.
    #[arg(long)]
    pub(crate) upload_dir: Option<PathBuf>,
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let upload_dir = args.upload_dir.unwrap_or_else(|| {
        std::env::temp_dir().join(format!(
            "scheme-portal-demo-{}",
            Utc::now().timestamp_millis()
        ))
    });
    let intake = Arc::new(DocumentIntake::new(
        &upload_dir,
        "/uploads",
        DEFAULT_MAX_UPLOAD_BYTES,
    ));
    intake.prepare().await?;

    let portal = Portal::in_memory(
        Arc::clone(&intake),
        &AdminConfig {
            username: "admin".to_string(),
            password: DEMO_ADMIN_PASSWORD.to_string(),
        },
    )?;

    println!("Scheme portal demo");
    println!("Uploads stored under {}", upload_dir.display());

    let scheme = portal
        .catalog
        .create(SchemeDraft {
            name: Some("PM-KISAN Income Support".to_string()),
            description: Some("Direct income support for small and marginal farmers".to_string()),
            target: Some("farmer".to_string()),
            eligibility: Eligibility {
                land_area: Some(1.0),
                annual_income: Some(300_000.0),
                ..Eligibility::default()
            },
            ..SchemeDraft::default()
        })
        .map_err(ApiError::from)?;
    println!("\nCreated scheme '{}' ({}) for {}", scheme.name, scheme.id, scheme.target);

    let form = demo_registration(&intake).await?;
    let farmer = portal
        .farmer
        .registration
        .register(form)
        .await
        .map_err(ApiError::from)?;
    println!("Registered farmer {} as {}", farmer.name, farmer.unique_id);

    let eligible = portal
        .farmer
        .lifecycle
        .eligible_schemes(&farmer.id.to_string())
        .map_err(ApiError::from)?;
    println!("Eligible schemes: {}", eligible.len());

    let document = intake
        .accept(
            "applicationDocument",
            b"%PDF-1.4 7/12 land record extract",
            "application/pdf",
            "land-record.pdf",
        )
        .await?;
    let application = portal
        .farmer
        .lifecycle
        .apply_for_scheme(&farmer.id.to_string(), &scheme.id.to_string(), Some(document))
        .await
        .map_err(ApiError::from)?;
    println!(
        "Applied: application {} is {}",
        application.id, application.status
    );

    let pending = portal
        .farmer
        .lifecycle
        .pending_schemes(&farmer.id.to_string())
        .map_err(ApiError::from)?;
    println!("Pending applications: {}", pending.len());

    let session = portal
        .admin
        .login("admin", DEMO_ADMIN_PASSWORD)
        .await
        .map_err(ApiError::from)?;
    println!("\nAdmin signed in (session issued {})", session.issued_at);

    let change = portal
        .admin
        .dispatch_status_update(
            "farmer",
            &farmer.id.to_string(),
            &application.id.to_string(),
            "approved",
        )
        .map_err(ApiError::from)?;
    println!("Application {} set to {}", change.application.id, change.application.status);

    println!("\nAdmin feed");
    for entry in portal.admin.list_all_applications().map_err(ApiError::from)? {
        println!(
            "- [{}] {} ({}) -> {} | {} | applied {}",
            entry.applicant_type,
            entry.applicant_name,
            entry.unique_id,
            entry.scheme_name,
            entry.status,
            entry.applied_on.format("%Y-%m-%d %H:%M"),
        );
    }

    println!("\nFarmer history");
    for entry in portal
        .farmer
        .lifecycle
        .scheme_history(&farmer.id.to_string())
        .map_err(ApiError::from)?
    {
        println!(
            "- {} | {} | {} document(s)",
            entry.scheme_name,
            entry.status,
            entry.documents.len()
        );
    }

    let pending = portal
        .farmer
        .lifecycle
        .pending_schemes(&farmer.id.to_string())
        .map_err(ApiError::from)?;
    println!("\nPending applications after review: {}", pending.len());

    Ok(())
}

async fn demo_registration(intake: &DocumentIntake) -> Result<UploadForm, AppError> {
    let fields: FormFields = [
        ("name", "Savita Shinde"),
        ("password", "demo-farmer"),
        ("age", "42"),
        ("farmLocation", "Baramati"),
        ("landArea", "2.5"),
        ("cropType", "Sugarcane"),
        ("annualIncome", "160000"),
    ]
    .into_iter()
    .collect();

    let picture = intake
        .accept("profilePic", b"\x89PNG\r\n", "image/png", "savita.png")
        .await?;
    let aadhaar = intake
        .accept("aadhaarCard", b"%PDF-1.4 aadhaar", "application/pdf", "aadhaar.pdf")
        .await?;
    Ok(UploadForm::new(fields).with_file(picture).with_file(aadhaar))
}
