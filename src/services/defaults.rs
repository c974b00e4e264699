//! Built-in catalog content
//!
//! Returned by listings when the store has nothing to show and used to seed
//! empty collections with `--seed-content`.

use crate::db::schemas::{Feature, ProductDoc, ProjectDoc, ServiceDoc};

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn icon_text(icon: &str, text: &str) -> Feature {
    Feature::IconText {
        icon: Some(icon.to_string()),
        text: text.to_string(),
    }
}

fn service(id: &str, icon: &str, title: &str, description: &str, features: &[&str], order: i32) -> ServiceDoc {
    ServiceDoc {
        _id: id.to_string(),
        icon: icon.to_string(),
        title: title.to_string(),
        description: description.to_string(),
        features: strings(features),
        is_active: true,
        order,
        created_at: None,
        updated_at: None,
    }
}

/// The six services offered
pub fn services() -> Vec<ServiceDoc> {
    vec![
        service(
            "service-1",
            "Database",
            "ERP Systems",
            "Sistem perencanaan sumber daya perusahaan yang terintegrasi untuk mengoptimalkan operasional bisnis Anda.",
            &["Manajemen Inventory", "Financial Management", "CRM Integration", "Real-time Analytics"],
            1,
        ),
        service(
            "service-2",
            "DollarSign",
            "Payroll Management",
            "Solusi komprehensif untuk mengelola penggajian karyawan dengan akurasi dan efisiensi tinggi.",
            &["Automated Calculations", "Tax Management", "Employee Self-Service", "Compliance Reporting"],
            2,
        ),
        service(
            "service-3",
            "Globe",
            "Web Development",
            "Pengembangan website dan aplikasi web modern dengan teknologi terdepan dan desain responsif.",
            &["Responsive Design", "Custom Development", "E-commerce Solutions", "SEO Optimization"],
            3,
        ),
        service(
            "service-4",
            "Smartphone",
            "Mobile Applications",
            "Aplikasi mobile native dan cross-platform untuk meningkatkan engagement dan produktivitas.",
            &["iOS & Android", "Cross-platform", "UI/UX Design", "API Integration"],
            4,
        ),
        service(
            "service-5",
            "Shield",
            "System Integration",
            "Integrasi sistem yang seamless untuk menghubungkan berbagai platform bisnis Anda.",
            &["API Development", "Third-party Integration", "Data Migration", "System Architecture"],
            5,
        ),
        service(
            "service-6",
            "Users",
            "IT Consulting",
            "Konsultasi teknologi informasi untuk strategi digital dan transformasi bisnis perusahaan.",
            &["Digital Strategy", "Technology Assessment", "Process Optimization", "Training & Support"],
            6,
        ),
    ]
}

/// The four in-house products
pub fn products() -> Vec<ProductDoc> {
    vec![
        ProductDoc {
            _id: "product-1".into(),
            icon: "DollarSign".into(),
            title: "Mabra Payroll".into(),
            subtitle: "Employee Payroll Management System".into(),
            description: "Aplikasi lengkap yang dikembangkan khusus untuk membantu perusahaan dalam mengelola penggajian karyawan dengan akurat dan efisien.".into(),
            features: [
                "Automated salary calculations",
                "Tax management & compliance",
                "Employee attendance integration",
                "Detailed payroll reports",
                "Multi-company support",
                "Bank integration for payments",
            ]
            .into_iter()
            .map(Feature::from)
            .collect(),
            color: "from-green-500 to-emerald-600".into(),
            is_active: true,
            order: 1,
            created_at: None,
            updated_at: None,
        },
        ProductDoc {
            _id: "product-2".into(),
            icon: "Home".into(),
            title: "DYRECS Vatriot".into(),
            subtitle: "Dynamic Residential Control System".into(),
            description: "Aplikasi canggih yang dapat mengendalikan berbagai peralatan rumah dari perumahan-perumahan dengan satu aplikasi terintegrasi dan data yang dinamis.".into(),
            features: vec![
                icon_text("Eye", "Realtime CCTV Monitoring"),
                icon_text("Monitor", "Kontrol Lampu"),
                icon_text("Fan", "Kontrol Kipas Angin"),
                icon_text("Thermometer", "Monitoring Suhu & Kelembaban"),
                icon_text("Terminal", "Kontrol Terminal"),
                icon_text("Calendar", "Autofeeder dan Scheduler"),
                icon_text("Droplets", "Pengisian Air Otomatis"),
            ],
            color: "from-blue-500 to-cyan-600".into(),
            is_active: true,
            order: 2,
            created_at: None,
            updated_at: None,
        },
        ProductDoc {
            _id: "product-3".into(),
            icon: "Shield".into(),
            title: "Patrol System".into(),
            subtitle: "Mobile Security Patrol Application".into(),
            description: "Aplikasi mobile yang dirancang khusus untuk personel keamanan/security dalam melakukan patroli, baik di dalam gedung maupun di lapangan dengan berbagai metode tracking.".into(),
            features: vec![
                icon_text("MapPin", "GPS Location Tracking"),
                icon_text("QrCode", "QR Code Scanning"),
                icon_text("Wifi", "NFC Scanning"),
                icon_text("Bluetooth", "Beacon Scanning"),
                "Real-time reporting".into(),
                "Route optimization".into(),
                "Incident management".into(),
                "Historical patrol data".into(),
            ],
            color: "from-red-500 to-orange-600".into(),
            is_active: true,
            order: 3,
            created_at: None,
            updated_at: None,
        },
        ProductDoc {
            _id: "product-4".into(),
            icon: "Users".into(),
            title: "RTRW-Online".into(),
            subtitle: "Neighborhood Management System".into(),
            description: "Aplikasi komprehensif untuk pengolahan data warga pada tingkat Rukun Tetangga dan Rukun Warga, memudahkan administrasi kependudukan di tingkat grassroot.".into(),
            features: [
                "Citizen data management",
                "Family card processing",
                "Document requests",
                "Community announcements",
                "Financial management",
                "Event organization",
                "Digital archive system",
                "Mobile accessibility",
            ]
            .into_iter()
            .map(Feature::from)
            .collect(),
            color: "from-purple-500 to-indigo-600".into(),
            is_active: true,
            order: 4,
            created_at: None,
            updated_at: None,
        },
    ]
}

/// Portfolio highlights, in display order
pub fn projects() -> Vec<ProjectDoc> {
    vec![
        ProjectDoc {
            _id: "project-1".into(),
            title: "Payroll Application".into(),
            client: "PT Sansan Saudaratex Jaya".into(),
            category: "Human Resource Management".into(),
            description: "Pengembangan aplikasi payroll komprehensif untuk mengelola penggajian karyawan PT Sansan Saudaratex Jaya. Sistem ini mengotomatisasi perhitungan gaji, tunjangan, dan potongan dengan akurasi tinggi.".into(),
            features: strings(&[
                "Automated salary calculations",
                "Tax deduction management",
                "Employee attendance integration",
                "Comprehensive reporting system",
                "Multi-department support",
            ]),
            technologies: strings(&["React.js", "Node.js", "MySQL", "Express.js"]),
            duration: "6 months".into(),
            year: "2022".into(),
            status: "Completed".into(),
            icon: "Calculator".into(),
            is_active: true,
            order: 1,
            created_at: None,
            updated_at: None,
        },
        ProjectDoc {
            _id: "project-2".into(),
            title: "Website & Online Recruitment".into(),
            client: "PT Andalan Multi Kencana (AllMakes)".into(),
            category: "Web Development & HR Tech".into(),
            description: "Pengembangan website corporate dan sistem rekrutmen online terintegrasi untuk PT Andalan Multi Kencana. Platform ini memungkinkan proses rekrutmen yang lebih efisien dan modern.".into(),
            features: strings(&[
                "Corporate website with CMS",
                "Online job application system",
                "Candidate tracking system",
                "Interview scheduling",
                "Document management",
                "Automated email notifications",
            ]),
            technologies: strings(&["WordPress", "PHP", "MySQL", "JavaScript", "Bootstrap"]),
            duration: "4 months".into(),
            year: "2021".into(),
            status: "Completed".into(),
            icon: "Users".into(),
            is_active: true,
            order: 2,
            created_at: None,
            updated_at: None,
        },
        ProjectDoc {
            _id: "project-3".into(),
            title: "Accounting Application".into(),
            client: "PT Sinar Panca Mitra Indonesia".into(),
            category: "Financial Management System".into(),
            description: "Implementasi sistem akuntansi digital untuk PT Sinar Panca Mitra Indonesia yang mencakup pencatatan transaksi, laporan keuangan, dan manajemen aset perusahaan.".into(),
            features: strings(&[
                "General ledger management",
                "Accounts payable & receivable",
                "Financial reporting",
                "Budget planning & tracking",
                "Asset management",
                "Tax calculation & reporting",
            ]),
            technologies: strings(&["Java", "Spring Boot", "PostgreSQL", "Angular", "Bootstrap"]),
            duration: "8 months".into(),
            year: "2023".into(),
            status: "Completed".into(),
            icon: "Building".into(),
            is_active: true,
            order: 3,
            created_at: None,
            updated_at: None,
        },
    ]
}
