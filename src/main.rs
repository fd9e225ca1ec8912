//! # sidreport CLI
//!
//! Usage:
//!   sidreport request.json -o report.pdf
//!   echo '{ ... }' | sidreport -o report.pdf
//!   sidreport --example > request.json
//!
//! The input is a render request: the raw report payload keyed by SID plus
//! the tenant's clinic profile. With no `-o` the output filename is derived
//! from the patient name and SID.

use std::env;
use std::fs;
use std::io::{self, Read};

use sidreport::model::RenderRequest;
use sidreport::report_file_name;

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();

    // Handle --example flag
    if args.iter().any(|a| a == "--example") {
        print!("{}", example_request_json());
        return;
    }

    let no_header = args.iter().any(|a| a == "--no-header");

    // Read input
    let input = if args.len() > 1 && !args[1].starts_with('-') {
        match fs::read_to_string(&args[1]) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("✗ Failed to read input file {}: {}", args[1], e);
                std::process::exit(1);
            }
        }
    } else {
        let mut buf = String::new();
        if let Err(e) = io::stdin().read_to_string(&mut buf) {
            eprintln!("✗ Failed to read stdin: {}", e);
            std::process::exit(1);
        }
        buf
    };

    let mut request: RenderRequest = match serde_json::from_str(&input) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("✗ Failed to parse request: {}", e);
            std::process::exit(1);
        }
    };
    if no_header {
        request.options.include_header = false;
    }

    // Parse output path; default derives from patient name and SID
    let output_path = args
        .windows(2)
        .find(|w| w[0] == "-o")
        .map(|w| w[1].clone())
        .unwrap_or_else(|| {
            report_file_name(
                request.report.patient_name.as_deref().unwrap_or(""),
                request.report.sid_no.as_deref().unwrap_or(""),
            )
        });

    match sidreport::render_request(&request) {
        Ok(pdf_bytes) => {
            if let Err(e) = fs::write(&output_path, &pdf_bytes) {
                eprintln!("✗ Failed to write PDF to {}: {}", output_path, e);
                std::process::exit(1);
            }
            eprintln!("✓ Written {} bytes to {}", pdf_bytes.len(), output_path);
        }
        Err(e) => {
            eprintln!("✗ {}", e);
            std::process::exit(1);
        }
    }
}

fn example_request_json() -> &'static str {
    r##"{
  "report": {
    "patientName": "Jane Doe",
    "age": "34 Years",
    "gender": "Female",
    "patientId": "PT-10482",
    "branchName": "Main Branch",
    "sidNo": "SID240817",
    "registeredAt": "2026-08-17 09:12",
    "collectedAt": "2026-08-17 09:30",
    "reportedAt": "2026-08-17 14:05",
    "testItems": [
      {
        "testName": "Complete Blood Count (CBC)",
        "department": "HEMATOLOGY",
        "method": "Automated Cell Counter",
        "specimen": "EDTA Whole Blood",
        "subTests": [
          { "name": "Hemoglobin", "result": "12.8", "unit": "g/dL", "referenceRange": "12.0 - 15.5" },
          { "name": "Total WBC Count", "result": "7200", "unit": "/cumm", "referenceRange": "4000 - 11000" },
          { "name": "Platelet Count", "result": "2.6", "unit": "lakhs/cumm", "referenceRange": "1.5 - 4.5" }
        ],
        "notes": "Peripheral smear shows normocytic normochromic picture."
      },
      {
        "testName": "Fasting Blood Sugar",
        "department": "BIOCHEMISTRY",
        "method": "GOD-POD",
        "specimen": "Fluoride Plasma",
        "result": "96",
        "unit": "mg/dL",
        "referenceRange": "Normal: 70 - 100 Prediabetes: 100 - 125 Diabetes: > 126"
      },
      {
        "testName": "TSH",
        "department": "BIOCHEMISTRY",
        "method": "CLIA",
        "specimen": "Serum",
        "result": "2.4",
        "unit": "uIU/mL",
        "referenceRange": "Adults: 0.4 - 4.2 Pregnancy 1st Trimester: 0.1 - 2.5"
      }
    ]
  },
  "clinic": {
    "branches": ["Main Branch, 12 Hospital Road", "City Center Branch, 4 Market Street"],
    "contactLine": "Phone: 040-2345-6789 | reports@example-labs.test | www.example-labs.test",
    "verifyUrl": "https://reports.example-labs.test/verify",
    "verifiedBy": { "name": "A. Kumar, M.Sc.", "title": "Lab Technologist" },
    "authorizedBy": { "name": "Dr. R. Sharma, MD", "title": "Consultant Pathologist" }
  },
  "options": { "includeHeader": true }
}"##
}
