//! Content types of the institution website.

use std::sync::Arc;

use crate::schema::{FieldSpec, ResourceSchema, SubCollection};

/// Every resource the API serves, looked up by route name.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    resources: Vec<Arc<ResourceSchema>>,
}

impl Catalog {
    pub fn new(resources: Vec<ResourceSchema>) -> Self {
        Self {
            resources: resources.into_iter().map(Arc::new).collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<ResourceSchema>> {
        self.resources.iter().find(|r| r.name == name).cloned()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<ResourceSchema>> {
        self.resources.iter()
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// The site's full set of content types.
    pub fn site() -> Self {
        Self::new(vec![
            hero_image(),
            testimonial(),
            program(),
            enquiry(),
            session(),
            career_post(),
            free_course(),
            mentor(),
            news(),
            content_section(),
            faq(),
            gallery_image(),
            partner(),
            stat(),
            announcement(),
            event(),
            placement(),
            site_setting(),
        ])
    }
}

fn url(name: &'static str) -> FieldSpec {
    FieldSpec::string(name).max_len(500)
}

fn hero_image() -> ResourceSchema {
    ResourceSchema::new("heroImage", "Hero image")
        .field(FieldSpec::string("title").required().max_len(120))
        .field(FieldSpec::string("subtitle").max_len(250))
        .field(url("imageUrl").required())
        .field(FieldSpec::string("buttonText").max_len(40))
        .field(url("buttonLink"))
        .ordered()
        .toggleable()
}

fn testimonial() -> ResourceSchema {
    ResourceSchema::new("testimonial", "Testimonial")
        .field(FieldSpec::string("name").required().length(2, 100))
        .field(FieldSpec::string("designation").max_len(100))
        .field(FieldSpec::string("course").max_len(120))
        .field(FieldSpec::string("message").required().length(10, 1000))
        .field(FieldSpec::integer("rating").range(1.0, 5.0).default(5))
        .field(url("imageUrl"))
        .ordered()
        .toggleable()
}

fn program() -> ResourceSchema {
    ResourceSchema::new("program", "Program")
        .field(FieldSpec::string("title").required().max_len(150))
        .field(FieldSpec::string("description").required().max_len(5000))
        .field(FieldSpec::string("duration").required().max_len(50))
        .field(FieldSpec::string("category").max_len(80))
        .field(
            FieldSpec::string("level")
                .one_of(&["beginner", "intermediate", "advanced"])
                .default("beginner"),
        )
        .field(
            FieldSpec::string("mode")
                .one_of(&["online", "offline", "hybrid"])
                .default("offline"),
        )
        .field(FieldSpec::number("fee").min(0.0))
        .field(url("imageUrl"))
        .sub(SubCollection::entities(
            "details",
            "Program detail",
            vec![
                FieldSpec::string("title").required().max_len(150),
                FieldSpec::string("description").max_len(2000),
            ],
        ))
        .sub(SubCollection::primitives(
            "highlights",
            "Highlight",
            FieldSpec::string("highlight").required().max_len(200),
        ))
        .search(&["title", "category", "description"])
        .ordered()
        .toggleable()
}

fn enquiry() -> ResourceSchema {
    ResourceSchema::new("enquiry", "Enquiry")
        .plural("enquiries")
        .field(FieldSpec::string("name").required().max_len(100))
        .field(FieldSpec::string("email").required().max_len(254))
        .field(FieldSpec::string("phone").required().length(7, 20))
        .field(FieldSpec::string("course").max_len(150))
        .field(FieldSpec::string("message").max_len(2000))
        .field(
            FieldSpec::string("status")
                .one_of(&["new", "contacted", "enrolled", "closed"])
                .default("new"),
        )
        .status_field("status")
        .search(&["name", "email", "phone", "course"])
}

fn session() -> ResourceSchema {
    ResourceSchema::new("session", "Session")
        .field(FieldSpec::string("title").required().max_len(150))
        .field(FieldSpec::string("speaker").max_len(100))
        .field(FieldSpec::string("description").max_len(2000))
        .field(FieldSpec::string("date").required().max_len(30))
        .field(FieldSpec::string("time").max_len(30))
        .field(
            FieldSpec::string("mode")
                .one_of(&["online", "offline"])
                .default("online"),
        )
        .field(url("meetingLink"))
        .field(FieldSpec::string("venue").max_len(200))
        .field(FieldSpec::integer("seats").min(0.0))
        .ordered()
        .toggleable()
}

fn career_post() -> ResourceSchema {
    ResourceSchema::new("careerPost", "Career post")
        .field(FieldSpec::string("title").required().max_len(150))
        .field(FieldSpec::string("department").max_len(100))
        .field(FieldSpec::string("location").max_len(100))
        .field(
            FieldSpec::string("type")
                .one_of(&["full-time", "part-time", "internship", "contract"])
                .default("full-time"),
        )
        .field(FieldSpec::string("experience").max_len(50))
        .field(FieldSpec::string("salary").max_len(50))
        .field(FieldSpec::string("description").required().max_len(5000))
        .field(FieldSpec::string("lastDate").max_len(30))
        .sub(SubCollection::primitives(
            "requirements",
            "Requirement",
            FieldSpec::string("requirement").required().max_len(300),
        ))
        .sub(SubCollection::entities(
            "applicants",
            "Applicant",
            vec![
                FieldSpec::string("name").required().max_len(100),
                FieldSpec::string("email").required().max_len(254),
                FieldSpec::string("phone").required().length(7, 20),
                url("resumeUrl"),
                FieldSpec::string("coverLetter").max_len(2000),
                FieldSpec::string("status")
                    .one_of(&["applied", "shortlisted", "rejected", "hired"])
                    .default("applied"),
            ],
        ))
        .search(&["title", "department", "location"])
        .toggleable()
}

fn free_course() -> ResourceSchema {
    ResourceSchema::new("freeCourse", "Free course")
        .field(FieldSpec::string("title").required().max_len(150))
        .field(FieldSpec::string("description").required().max_len(2000))
        .field(FieldSpec::string("instructor").max_len(100))
        .field(FieldSpec::string("duration").max_len(50))
        .field(url("imageUrl"))
        .field(url("videoUrl"))
        .sub(SubCollection::primitives(
            "learningItems",
            "Learning item",
            FieldSpec::string("learningItem").required().max_len(200),
        ))
        .ordered()
        .toggleable()
}

fn mentor() -> ResourceSchema {
    ResourceSchema::new("mentor", "Mentor")
        .field(FieldSpec::string("name").required().max_len(100))
        .field(FieldSpec::string("designation").max_len(100))
        .field(FieldSpec::strings("expertise"))
        .field(FieldSpec::string("bio").max_len(1000))
        .field(FieldSpec::integer("experienceYears").min(0.0))
        .field(url("imageUrl"))
        .field(url("linkedinUrl"))
        .ordered()
        .toggleable()
}

fn news() -> ResourceSchema {
    ResourceSchema::new("news", "News")
        .plural("news")
        .field(FieldSpec::string("title").required().max_len(200))
        .field(FieldSpec::string("summary").max_len(300))
        .field(FieldSpec::string("content").required().max_len(20000))
        .field(FieldSpec::string("category").max_len(80))
        .field(FieldSpec::string("author").max_len(100))
        .field(FieldSpec::string("publishedAt").max_len(30))
        .field(url("imageUrl"))
        .search(&["title", "summary", "category"])
        .toggleable()
}

fn content_section() -> ResourceSchema {
    ResourceSchema::new("content", "Content section")
        .field(FieldSpec::string("sectionType").required().max_len(50))
        .field(FieldSpec::string("title").required().max_len(200))
        .field(FieldSpec::string("subtitle").max_len(300))
        .field(FieldSpec::string("content").required().max_len(20000))
        .field(url("imageUrl"))
        .unique_key("sectionType")
        .ordered()
        .toggleable()
}

fn faq() -> ResourceSchema {
    ResourceSchema::new("faq", "FAQ")
        .field(FieldSpec::string("question").required().max_len(300))
        .field(FieldSpec::string("answer").required().max_len(3000))
        .field(FieldSpec::string("category").max_len(80))
        .search(&["question", "answer"])
        .ordered()
        .toggleable()
}

fn gallery_image() -> ResourceSchema {
    ResourceSchema::new("galleryImage", "Gallery image")
        .field(FieldSpec::string("title").max_len(150))
        .field(url("imageUrl").required())
        .field(FieldSpec::string("category").max_len(80))
        .ordered()
        .toggleable()
}

fn partner() -> ResourceSchema {
    ResourceSchema::new("partner", "Partner")
        .field(FieldSpec::string("name").required().max_len(150))
        .field(url("logoUrl").required())
        .field(url("website"))
        .ordered()
        .toggleable()
}

fn stat() -> ResourceSchema {
    ResourceSchema::new("stat", "Stat")
        .field(FieldSpec::string("label").required().max_len(80))
        .field(FieldSpec::string("value").required().max_len(30))
        .field(FieldSpec::string("icon").max_len(80))
        .ordered()
        .toggleable()
}

fn announcement() -> ResourceSchema {
    ResourceSchema::new("announcement", "Announcement")
        .field(FieldSpec::string("text").required().max_len(300))
        .field(url("link"))
        .field(FieldSpec::string("startDate").max_len(30))
        .field(FieldSpec::string("endDate").max_len(30))
        .ordered()
        .toggleable()
}

fn event() -> ResourceSchema {
    ResourceSchema::new("event", "Event")
        .field(FieldSpec::string("title").required().max_len(150))
        .field(FieldSpec::string("description").max_len(5000))
        .field(FieldSpec::string("date").required().max_len(30))
        .field(FieldSpec::string("venue").max_len(200))
        .field(url("imageUrl"))
        .field(url("registrationLink"))
        .search(&["title", "venue"])
        .toggleable()
}

fn placement() -> ResourceSchema {
    ResourceSchema::new("placement", "Placement")
        .field(FieldSpec::string("studentName").required().max_len(100))
        .field(FieldSpec::string("company").required().max_len(150))
        .field(FieldSpec::string("role").max_len(100))
        .field(FieldSpec::string("package").max_len(50))
        .field(FieldSpec::string("batch").max_len(30))
        .field(url("imageUrl"))
        .search(&["studentName", "company", "role"])
        .ordered()
        .toggleable()
}

fn site_setting() -> ResourceSchema {
    ResourceSchema::new("setting", "Site setting")
        .field(FieldSpec::string("key").required().max_len(80))
        .field(FieldSpec::string("value").required().untrimmed().max_len(5000))
        .field(FieldSpec::string("description").max_len(300))
        .unique_key("key")
}
